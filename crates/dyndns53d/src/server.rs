// # HTTP Service
//
// Routes:
//
// - `GET /register_ip` (Basic auth): reconcile the caller's record with its
//   observed address; `200` with an empty body on success
// - `GET /check_ip`: echo the observed address as plain text
//
// Update clients only see status codes; error bodies carry nothing.

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use dyndns53_core::{CredentialStore, Error, Reconciler, derive_domain};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::address::observed_address;
use crate::auth::{BasicCredentials, challenge};

/// Shared state of the HTTP service
#[derive(Clone)]
pub struct AppState {
    /// Hostname → secret table
    pub credentials: Arc<CredentialStore>,
    /// Record reconciler
    pub reconciler: Reconciler,
}

impl AppState {
    pub fn new(credentials: Arc<CredentialStore>, reconciler: Reconciler) -> Self {
        Self {
            credentials,
            reconciler,
        }
    }
}

/// Build the router
///
/// Handlers need the peer address; serve with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register_ip", get(register_ip))
        .route("/check_ip", get(check_ip))
        .with_state(state)
}

/// Request failure, rendered as a bare status code
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed or wrong credentials
    Unauthorized,
    /// The observed address is not an IP address
    BadRequest(Error),
    /// Credential loading or reconciliation failed
    Internal(Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, challenge())]).into_response()
            }
            ApiError::BadRequest(e) => {
                warn!("Rejecting request: {}", e);
                StatusCode::BAD_REQUEST.into_response()
            }
            ApiError::Internal(e) => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[tracing::instrument(name = "register_ip", skip_all)]
async fn register_ip(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let credentials = BasicCredentials::from_headers(&headers).ok_or(ApiError::Unauthorized)?;

    let verified = state
        .credentials
        .verify(&credentials.username, &credentials.password)
        .await
        .map_err(ApiError::Internal)?;
    if !verified {
        warn!("Authentication failed for {} from {}", credentials.username, peer);
        return Err(ApiError::Unauthorized);
    }

    let hostname = credentials.username;
    let domain = derive_domain(&hostname);
    let observed = observed_address(&headers, peer);
    let ipaddr = observed
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| {
            ApiError::BadRequest(Error::invalid_input(format!(
                "observed address '{}' for {} is not an IP address",
                observed, hostname
            )))
        })?
        // ::ffff:a.b.c.d from a dual-stack proxy is an IPv4 client
        .to_canonical();

    let result = state
        .reconciler
        .reconcile(&domain, &hostname, ipaddr)
        .await
        .map_err(ApiError::Internal)?;

    info!("Registered {} at {} ({:?})", hostname, ipaddr, result);
    Ok(StatusCode::OK)
}

async fn check_ip(ConnectInfo(peer): ConnectInfo<SocketAddr>, headers: HeaderMap) -> String {
    observed_address(&headers, peer)
}
