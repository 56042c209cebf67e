//! Authentication and client IP policy

use crate::ApiError;
use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Header carrying the allowlist bypass secret
pub const BYPASS_HEADER: &str = "x-bypass-whitelist";

/// Client address as resolved by the IP gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientIp {
    /// Resolved client address, if any could be determined
    pub ip: Option<IpAddr>,
    /// Whether the allowlist was skipped via the bypass header
    pub bypassed: bool,
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Check the Authorization header against the configured secret.
///
/// The header may hold the raw token or `Bearer <token>`. An empty
/// configured token never authenticates anyone.
pub fn check_token(auth_header: Option<&str>, token: &str) -> Result<(), ApiError> {
    let header = auth_header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Authorization token is missing".to_string()))?;

    let presented = extract_bearer_token(header).unwrap_or(header);
    if token.is_empty() || presented != token {
        return Err(ApiError::Unauthorized(
            "Authorization token is invalid".to_string(),
        ));
    }

    Ok(())
}

fn parse_header_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Resolve the client address.
///
/// With `trust_proxy` the order is leftmost `X-Forwarded-For` entry,
/// `X-Real-IP`, then the socket peer; without it only the peer counts.
/// IPv4-mapped IPv6 addresses are reduced to IPv4.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trust_proxy: bool,
) -> Option<IpAddr> {
    if !trust_proxy {
        return peer.map(|ip| ip.to_canonical());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_header_ip);

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_header_ip)
    };

    forwarded
        .or_else(real_ip)
        .or(peer)
        .map(|ip| ip.to_canonical())
}

/// Whether the request presented the configured bypass secret
pub fn has_bypass(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };

    headers
        .get(BYPASS_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == secret)
}

/// Apply the IP gate: bypass secret first, then the allowlist
pub fn check_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    allowlist: &[IpAddr],
    bypass_secret: Option<&str>,
    trust_proxy: bool,
) -> Result<ClientIp, ApiError> {
    let ip = resolve_client_ip(headers, peer, trust_proxy);

    if has_bypass(headers, bypass_secret) {
        return Ok(ClientIp { ip, bypassed: true });
    }

    match ip {
        Some(addr) if allowlist.iter().any(|allowed| allowed.to_canonical() == addr) => {
            Ok(ClientIp { ip, bypassed: false })
        }
        _ => Err(ApiError::Forbidden("IP not allowed".to_string())),
    }
}
