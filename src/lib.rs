//! Cabinet - file-management gateway
//!
//! Cabinet serves a token-authenticated file hierarchy: user accounts and
//! file metadata live in MongoDB, binary content lives on a local storage
//! root, and sessions are tokens in an expiring key-value store.
//!
//! ## Services
//!
//! - **Auth**: Basic-credential sign-in exchanged for bearer session tokens
//! - **Users**: account registration with Argon2 password hashing
//! - **Files**: folder/file/image hierarchy with per-owner visibility
//! - **Storage**: content-on-disk blob store addressed by random filenames

pub mod auth;
pub mod config;
pub mod db;
pub mod files;
pub mod routes;
pub mod server;
pub mod storage;
pub mod types;
pub mod users;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CabinetError, Result};
