//! Configuration for Cabinet
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::types::{CabinetError, Result};

/// Cabinet - file-management gateway
///
/// Serves a token-authenticated file hierarchy whose metadata lives in
/// MongoDB and whose binary content lives on a local storage root.
#[derive(Parser, Debug, Clone)]
#[command(name = "cabinet")]
#[command(about = "File-management gateway (sessions, folders, files, blobs)")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "files_manager")]
    pub mongodb_db: String,

    /// Storage root for blob content
    #[arg(long, env = "FOLDER_PATH", default_value = "/tmp/files_manager")]
    pub folder_path: PathBuf,

    /// Session lifetime in seconds (24 hours by default)
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "86400")]
    pub session_ttl_secs: u64,

    /// Enable development mode (in-memory stores, no MongoDB required)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_secs == 0 {
            return Err(CabinetError::Config(
                "SESSION_TTL_SECS must be greater than zero".into(),
            ));
        }
        if self.folder_path.as_os_str().is_empty() {
            return Err(CabinetError::Config("FOLDER_PATH must not be empty".into()));
        }
        Ok(())
    }

    /// Session lifetime as a Duration
    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let args = Args::parse_from(["cabinet"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.session_ttl_secs, 86400);
        assert_eq!(args.folder_path, PathBuf::from("/tmp/files_manager"));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let args = Args::parse_from(["cabinet", "--session-ttl-secs", "0"]);
        assert!(args.validate().is_err());
    }
}
