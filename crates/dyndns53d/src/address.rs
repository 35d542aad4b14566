//! Observed client address

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Header set by a fronting proxy
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address a request appears to come from
///
/// The `X-Forwarded-For` value is used verbatim when present and
/// non-empty; otherwise the peer socket's IP.
pub fn observed_address(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_canonical().to_string())
}
