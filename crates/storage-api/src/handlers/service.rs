//! Service-level handlers (liveness)

use crate::envelope::ResultEnvelope;
use axum::{http::StatusCode, response::Response};

/// GET /v1 - Liveness message
pub async fn home() -> Response {
    let mut result: ResultEnvelope<String> = ResultEnvelope::new();
    result.add_message("API is up and running!");
    result.respond(StatusCode::OK)
}
