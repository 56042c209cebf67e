//! Uniform JSON response envelope

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// One entry of the envelope's `errors` list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    /// HTTP-style status code describing the failure
    pub code: u16,
    /// Human-readable description
    pub message: String,
}

/// Response wrapper returned by every JSON endpoint.
///
/// `has_errors` is only ever set by [`ResultEnvelope::add_error`], so it is
/// true exactly when `errors` is non-empty.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
    #[serde(default)]
    has_errors: bool,
}

impl<T> Default for ResultEnvelope<T> {
    fn default() -> Self {
        Self {
            message: None,
            data: None,
            errors: Vec::new(),
            has_errors: false,
        }
    }
}

impl<T> ResultEnvelope<T> {
    /// Create an empty envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the summary message
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Set the payload
    pub fn add_data(&mut self, data: T) {
        self.data = Some(data);
    }

    /// Append an error entry
    pub fn add_error(&mut self, code: StatusCode, message: impl Into<String>) {
        self.errors.push(EnvelopeError {
            code: code.as_u16(),
            message: message.into(),
        });
        self.has_errors = true;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> &[EnvelopeError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }
}

impl<T: Serialize> ResultEnvelope<T> {
    /// Serialize into a JSON response with the given status
    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
