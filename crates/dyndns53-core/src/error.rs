//! Error types for the dyndns53 service
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for dyndns53 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dyndns53 service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or invalid environment options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The domain is not a hosted zone at the provider
    #[error("Hosted zone not found: {0}")]
    ZoneNotFound(String),

    /// The provider rejected a conditional change because its state
    /// differs from what the client read
    #[error("Provider conflict ({provider}): {message}")]
    ProviderConflict {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Any other provider-side failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Blob store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Credential database could not be parsed
    #[error("Credential database error: {0}")]
    Database(String),

    /// HTTP transport errors (from provider and storage clients)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound(domain.into())
    }

    /// Create a provider conflict error
    pub fn conflict(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderConflict {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a credential database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this is the provider's optimistic-concurrency rejection
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ProviderConflict { .. })
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Database(err.to_string())
    }
}
