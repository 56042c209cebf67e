//! Error types and their envelope rendering

use crate::envelope::ResultEnvelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage_api_store::StoreError;
use thiserror::Error;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed path, filename or form field
    #[error("{0}")]
    Validation(String),

    /// Missing object or route
    #[error("{0}")]
    NotFound(String),

    /// Key already taken
    #[error("{0}")]
    Conflict(String),

    /// Known route, unsupported method
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Missing or wrong bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// Client IP not allowed
    #[error("{0}")]
    Forbidden(String),

    /// The object existed but the store refused to delete it
    #[error("File could not be deleted")]
    DeleteFailed(#[source] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Map a failed lookup of an object to a 404.
    ///
    /// Download and delete report every lookup failure as 404; only the
    /// message differs between a missing key and an unreachable store.
    pub fn from_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound("File does not exist".to_string()),
            other => Self::NotFound(other.to_string()),
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DeleteFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Summary placed in the envelope's `message` field, if any
    fn summary(&self) -> Option<String> {
        match self {
            Self::Unauthorized(message) => Some(message.clone()),
            Self::Forbidden(_) => Some("Access Denied".to_string()),
            Self::DeleteFailed(_) => Some(self.to_string()),
            _ => None,
        }
    }

    /// Text of the envelope's error entry
    fn detail(&self) -> String {
        match self {
            Self::DeleteFailed(source) => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Render into the uniform envelope
    pub fn to_envelope(&self) -> ResultEnvelope<()> {
        let mut envelope = ResultEnvelope::new();
        if let Some(summary) = self.summary() {
            envelope.add_message(summary);
        }
        envelope.add_error(self.status_code(), self.detail());
        envelope
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self.detail(), "Request failed");
        }
        self.to_envelope().respond(status)
    }
}
