//! HTTP Basic authentication
//!
//! Update clients authenticate with their fully-qualified hostname as the
//! username and their shared secret as the password.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Realm advertised in `WWW-Authenticate` challenges
pub const REALM: &str = "dyndns53";

/// Credentials presented in an `Authorization: Basic` header
///
/// The Debug implementation does NOT expose the password.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Hostname being updated
    pub username: String,
    /// Shared secret
    /// ⚠️ NEVER log this value
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl BasicCredentials {
    /// Extract credentials from request headers
    ///
    /// Returns `None` when the header is missing, uses another scheme, is
    /// not valid base64 or UTF-8, or has no `:` separator.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }

    /// Parse an `Authorization` header value
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Render as an `Authorization` header value
    pub fn header_value(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.username, self.password))
        )
    }
}

/// `WWW-Authenticate` value for 401 responses
pub fn challenge() -> String {
    format!("Basic realm=\"{}\"", REALM)
}
