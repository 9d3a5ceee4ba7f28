//! MongoDB access layer

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient};
