//! Database schemas for Cabinet
//!
//! MongoDB document structures for users and file nodes.

mod file;
mod user;

pub use file::{FileDoc, FileKind, FileNode, Parent, FILE_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
