//! Shared types for Cabinet

mod error;

pub use error::{CabinetError, Result};
