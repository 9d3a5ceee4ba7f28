//! Authentication for Cabinet
//!
//! Provides:
//! - Token sessions over an expiring key-value store
//! - Basic-credential parsing for session creation
//! - Password hashing with Argon2

pub mod basic;
pub mod password;
pub mod session;

pub use basic::{parse_basic_header, BasicCredentials};
pub use password::{hash_password, verify_password};
pub use session::{spawn_sweep_task, KeyValueStore, MemoryKv, SessionManager};
