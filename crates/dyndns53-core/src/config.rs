//! Configuration types for the dyndns53 service
//!
//! All configuration comes from environment variables. Parsing goes through
//! a lookup function so callers (and tests) can supply their own source;
//! the `from_env` constructors use the process environment.
//!
//! AWS credentials are read only from `AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY` and the optional `AWS_SESSION_TOKEN`. There is no
//! fallback to `~/.aws/credentials`, `AWS_PROFILE`, or the EC2 instance and
//! ECS container role endpoints. On EC2 or ECS, export the role's temporary
//! credentials into these variables before starting the binaries.

use serde::{Deserialize, Serialize};

/// Bucket holding the credential database
pub const ENV_BUCKET: &str = "DYNDNS_BUCKET";
/// Object key of the credential database
pub const ENV_DATABASE: &str = "DYNDNS_DATABASE";
/// Local path of the credential database (file storage)
pub const ENV_DATABASE_PATH: &str = "DYNDNS_DATABASE_PATH";
/// Storage backend selector
pub const ENV_STORAGE: &str = "DYNDNS_STORAGE";
/// Zone provider selector
pub const ENV_PROVIDER: &str = "DYNDNS_PROVIDER";
/// Zone apexes served by the memory provider (comma-separated)
pub const ENV_MEMORY_ZONES: &str = "DYNDNS_MEMORY_ZONES";
/// Maximum log level for the binaries
pub const ENV_LOG_LEVEL: &str = "DYNDNS_LOG_LEVEL";

const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const ENV_AWS_REGION: &str = "AWS_REGION";

const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Look up a variable in the process environment
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Look up a variable, treating empty values as absent
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// AWS credentials and region
///
/// Only the `AWS_*` environment variables listed in the module docs are
/// consulted; shared config files and instance metadata are not.
///
/// The Debug implementation does NOT expose the secret key or session token.
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    /// ⚠️ NEVER log this value
    pub secret_access_key: String,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
    /// Region used for regional services (S3)
    pub region: String,
}

impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("region", &self.region)
            .finish()
    }
}

impl AwsConfig {
    /// Read AWS settings using `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            access_key_id: non_empty(&lookup, ENV_AWS_ACCESS_KEY_ID).unwrap_or_default(),
            secret_access_key: non_empty(&lookup, ENV_AWS_SECRET_ACCESS_KEY)
                .unwrap_or_default(),
            session_token: non_empty(&lookup, ENV_AWS_SESSION_TOKEN),
            region: non_empty(&lookup, ENV_AWS_REGION)
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the AWS configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.access_key_id.is_empty() {
            return Err(crate::Error::config(format!(
                "{} is required for AWS backends",
                ENV_AWS_ACCESS_KEY_ID
            )));
        }
        if self.secret_access_key.is_empty() {
            return Err(crate::Error::config(format!(
                "{} is required for AWS backends",
                ENV_AWS_SECRET_ACCESS_KEY
            )));
        }
        if self.region.is_empty() {
            return Err(crate::Error::config("AWS region cannot be empty"));
        }
        Ok(())
    }
}

/// DNS zone provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Amazon Route 53
    Route53 {
        /// Credentials used to sign requests
        aws: AwsConfig,
    },

    /// In-memory zones (local runs and tests)
    Memory {
        /// Zone apexes to create at startup
        zones: Vec<String>,
    },
}

impl ProviderConfig {
    /// Load the provider configuration from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(env_lookup)
    }

    /// Load the provider configuration using `lookup`
    ///
    /// `DYNDNS_PROVIDER` selects the backend (default `route53`). The memory
    /// backend reads its zones from the comma-separated `DYNDNS_MEMORY_ZONES`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = non_empty(&lookup, ENV_PROVIDER).unwrap_or_else(|| "route53".to_string());

        let config = match kind.to_lowercase().as_str() {
            "route53" => ProviderConfig::Route53 {
                aws: AwsConfig::from_lookup(&lookup)?,
            },
            "memory" => ProviderConfig::Memory {
                zones: non_empty(&lookup, ENV_MEMORY_ZONES)
                    .unwrap_or_default()
                    .split(',')
                    .map(|s| s.trim().trim_end_matches('.').to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            other => {
                return Err(crate::Error::config(format!(
                    "{} '{}' is not supported. Supported providers: route53, memory",
                    ENV_PROVIDER, other
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53 { aws } => aws.validate(),
            ProviderConfig::Memory { .. } => Ok(()),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
            ProviderConfig::Memory { .. } => "memory",
        }
    }
}

/// Credential database storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Object in an S3 bucket
    ///
    /// Bucket and key are only required when the object is first accessed,
    /// so commands that never touch storage run without them.
    S3 {
        /// Credentials used to sign requests
        aws: AwsConfig,
        /// Bucket name (`DYNDNS_BUCKET`)
        bucket: Option<String>,
        /// Object key (`DYNDNS_DATABASE`)
        key: Option<String>,
    },

    /// Local file
    File {
        /// Path to the database file
        path: String,
    },
}

impl StorageConfig {
    /// Load the storage configuration from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(env_lookup)
    }

    /// Load the storage configuration using `lookup`
    ///
    /// `DYNDNS_STORAGE` selects the backend (default `s3`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = non_empty(&lookup, ENV_STORAGE).unwrap_or_else(|| "s3".to_string());

        let config = match kind.to_lowercase().as_str() {
            "s3" => StorageConfig::S3 {
                aws: AwsConfig::from_lookup(&lookup)?,
                bucket: non_empty(&lookup, ENV_BUCKET),
                key: non_empty(&lookup, ENV_DATABASE),
            },
            "file" => StorageConfig::File {
                path: non_empty(&lookup, ENV_DATABASE_PATH).unwrap_or_default(),
            },
            other => {
                return Err(crate::Error::config(format!(
                    "{} '{}' is not supported. Supported storage: s3, file",
                    ENV_STORAGE, other
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the storage configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StorageConfig::S3 { aws, .. } => aws.validate(),
            StorageConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config(format!(
                        "{} is required when {}=file",
                        ENV_DATABASE_PATH, ENV_STORAGE
                    )));
                }
                Ok(())
            }
        }
    }

    /// Get the storage type name
    pub fn type_name(&self) -> &str {
        match self {
            StorageConfig::S3 { .. } => "s3",
            StorageConfig::File { .. } => "file",
        }
    }
}

/// Parse a log level name (`trace`, `debug`, `info`, `warn`, `error`)
pub fn parse_log_level(value: &str) -> Result<tracing::Level, crate::Error> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        other => Err(crate::Error::config(format!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL, other
        ))),
    }
}
