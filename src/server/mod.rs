//! HTTP server for Cabinet

mod http;

pub use http::{run, AppState};
