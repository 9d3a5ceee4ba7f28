//! Disk-backed blob storage

mod blob;

pub use blob::{decode_payload, BlobStore};
