//! Disk-backed blob storage
//!
//! Stores opaque payloads under the storage root, one file per blob, named
//! by a fresh random id. The root is created on demand; `create_dir_all`
//! is idempotent, so the existence check racing another writer costs only
//! redundant work.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{CabinetError, Result};

/// Blob storage manager
pub struct BlobStore {
    /// Root directory for blob content
    root_dir: PathBuf,
}

impl BlobStore {
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Write a payload in full and return its path.
    ///
    /// Any failure here surfaces before the caller touches the file index,
    /// so a disk error never leaves metadata pointing at a missing blob.
    pub async fn write(&self, payload: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| CabinetError::Storage(format!("Failed to create storage root: {}", e)))?;

        let path = self.root_dir.join(Uuid::new_v4().to_string());
        fs::write(&path, payload)
            .await
            .map_err(|e| CabinetError::Storage(format!("Failed to write blob: {}", e)))?;

        info!(path = %path.display(), size = payload.len(), "Stored blob");
        Ok(path)
    }

    /// Read a blob back. Absence at read time (out-of-band deletion) is
    /// `NotFound`, distinct from the metadata record being absent.
    pub async fn read(&self, local_path: &str) -> Result<Vec<u8>> {
        match fs::read(local_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %local_path, "Blob missing on disk");
                Err(CabinetError::NotFound)
            }
            Err(e) => Err(CabinetError::Storage(format!("Failed to read blob: {}", e))),
        }
    }
}

/// Decode a base64 upload payload. Rejected before any disk write.
pub fn decode_payload(data: &str) -> Result<Vec<u8>> {
    BASE64.decode(data).map_err(|_| CabinetError::InvalidData)
}
