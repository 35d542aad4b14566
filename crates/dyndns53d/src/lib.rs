// # dyndns53d
//
// HTTP surface of the dyndns53 dynamic DNS service. Update clients call
// `GET /register_ip` with Basic credentials (hostname and shared secret);
// the daemon points the hostname's address record at the address the
// request came from.
//
// Business logic lives in `dyndns53-core`; this crate only authenticates,
// extracts the observed address and maps outcomes to status codes.

pub mod address;
pub mod auth;
pub mod config;
pub mod server;

pub use config::DaemonConfig;
pub use server::{ApiError, AppState, router};
