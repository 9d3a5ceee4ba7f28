//! Error types for Cabinet
//!
//! Validation failures carry the exact message the API returns, so the
//! HTTP layer maps each variant 1:1 onto a status code and `{"error": ...}`
//! body without reformatting.

use hyper::StatusCode;

/// Main error type for Cabinet operations
#[derive(Debug, thiserror::Error)]
pub enum CabinetError {
    /// Missing, invalid or expired credentials. Always the generic message:
    /// the API never reveals which credential check failed.
    #[error("Unauthorized")]
    Unauthorized,

    /// Unknown id, or a private file requested by a non-owner. The two cases
    /// are intentionally indistinguishable.
    #[error("Not found")]
    NotFound,

    #[error("Missing email")]
    MissingEmail,

    #[error("Missing password")]
    MissingPassword,

    /// Duplicate email on registration
    #[error("Already exist")]
    AlreadyExist,

    #[error("Missing name")]
    MissingName,

    #[error("Missing type")]
    MissingType,

    #[error("Missing data")]
    MissingData,

    /// Upload payload is not decodable base64
    #[error("Invalid data")]
    InvalidData,

    #[error("Parent not found")]
    ParentNotFound,

    #[error("Parent is not a folder")]
    ParentNotAFolder,

    /// Raw-content request against a folder node
    #[error("A folder doesn't have content")]
    FolderHasNoContent,

    /// Malformed request body or query parameter
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Blob read/write failure on the storage root
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document-store or session-store connectivity failure
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CabinetError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingEmail
            | Self::MissingPassword
            | Self::AlreadyExist
            | Self::MissingName
            | Self::MissingType
            | Self::MissingData
            | Self::InvalidData
            | Self::ParentNotFound
            | Self::ParentNotAFolder
            | Self::FolderHasNoContent
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.to_string();
        (status, body)
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for CabinetError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CabinetError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for CabinetError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for CabinetError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for Cabinet operations
pub type Result<T> = std::result::Result<T, CabinetError>;
