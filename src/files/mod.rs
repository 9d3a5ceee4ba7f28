//! File hierarchy: index, access policy, upload pipeline

pub mod index;
pub mod policy;
pub mod upload;

pub use index::{FileIndex, MemoryFileIndex, MongoFileIndex, PAGE_SIZE};
pub use upload::{UploadPipeline, UploadRequest};
