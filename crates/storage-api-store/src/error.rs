//! Error types for the storage-api-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during object store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No object under the key
    #[error("object not found: {0}")]
    NotFound(String),

    /// Conditional write refused because the key is taken
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    /// Transport, auth or provider failure
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// Client could not be configured
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether this error means the key is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
