//! HTTP middleware for access control, logging and panic recovery

use crate::auth::{ClientIp, check_ip, check_token};
use crate::envelope::ResultEnvelope;
use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

/// IP allowlist middleware.
///
/// Runs before the token check. The resolved [`ClientIp`] is attached to
/// both the request and the response so the request log can report it.
pub async fn ip_gate_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let client = check_ip(
        request.headers(),
        peer,
        &state.config.whitelist_ips,
        state.config.bypass_whitelist.as_deref(),
        state.config.trust_proxy,
    )
    .inspect_err(|_| {
        tracing::warn!(
            peer = ?peer,
            path = %request.uri().path(),
            "Rejected request from address outside the allowlist"
        );
    })?;

    if client.bypassed {
        tracing::warn!(ip = ?client.ip, "IP allowlist bypassed via header");
    }

    request.extensions_mut().insert(client);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(client);
    Ok(response)
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Err(err) = check_token(auth_header, &state.config.token) {
        tracing::error!("{}", err);
        return Err(err);
    }

    Ok(next.run(request).await)
}

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    // Set by the IP gate, absent when the gate rejected the request
    let client = response.extensions().get::<ClientIp>().copied();

    tracing::info!(
        peer = ?peer,
        client = ?client.and_then(|c| c.ip),
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

/// Fallback for unknown routes
pub async fn not_found_fallback() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Fallback for known routes called with an unsupported method
pub async fn method_not_allowed_fallback() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".to_string())
}

/// Turn a handler panic into the generic 500 envelope
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");

    let mut envelope: ResultEnvelope<()> = ResultEnvelope::new();
    envelope.add_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    envelope.respond(StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_response_is_envelope() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
