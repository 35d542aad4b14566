// # dyndns53-aws
//
// Amazon Web Services backends for dyndns53:
//
// - `route53`: [`ZoneClient`] over the Route 53 REST API
// - `s3`: [`BlobStore`] over a single S3 object
// - `sigv4`: request signing shared by both
//
// ## Security
//
// - Credentials come from `AwsConfig` only and NEVER appear in logs
// - Backends fail at construction if credentials are empty
//
// [`ZoneClient`]: dyndns53_core::ZoneClient
// [`BlobStore`]: dyndns53_core::BlobStore

pub mod route53;
pub mod s3;
pub mod sigv4;
mod xml;

pub use route53::Route53ZoneClient;
pub use s3::S3BlobStore;

use dyndns53_core::config::{ProviderConfig, StorageConfig};
use dyndns53_core::registry::BackendRegistry;
use dyndns53_core::traits::{BlobStore, BlobStoreFactory, ZoneClient, ZoneClientFactory};
use dyndns53_core::{Error, Result};

/// Factory for Route 53 zone clients
pub struct Route53Factory;

impl ZoneClientFactory for Route53Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneClient>> {
        match config {
            ProviderConfig::Route53 { aws } => Ok(Box::new(Route53ZoneClient::new(aws)?)),
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Factory for S3 blob stores
pub struct S3Factory;

impl BlobStoreFactory for S3Factory {
    fn create(&self, config: &StorageConfig) -> Result<Box<dyn BlobStore>> {
        match config {
            StorageConfig::S3 { aws, bucket, key } => Ok(Box::new(S3BlobStore::new(
                aws,
                bucket.clone(),
                key.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for S3 storage")),
        }
    }
}

/// Register the AWS backends with a registry
///
/// # Example
///
/// ```rust
/// use dyndns53_core::BackendRegistry;
///
/// let registry = BackendRegistry::with_builtins();
/// dyndns53_aws::register(&registry);
///
/// assert!(registry.has_zone_client("route53"));
/// assert!(registry.has_blob_store("s3"));
/// ```
pub fn register(registry: &BackendRegistry) {
    registry.register_zone_client("route53", Box::new(Route53Factory));
    registry.register_blob_store("s3", Box::new(S3Factory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyndns53_core::AwsConfig;

    fn aws(secret: &str) -> AwsConfig {
        AwsConfig {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: secret.to_string(),
            session_token: None,
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_factory_creation() {
        let registry = BackendRegistry::with_builtins();
        register(&registry);

        let zones = registry
            .create_zone_client(&ProviderConfig::Route53 { aws: aws("secret") })
            .unwrap();
        assert_eq!(zones.provider_name(), "route53");

        let store = registry
            .create_blob_store(&StorageConfig::S3 {
                aws: aws("secret"),
                bucket: Some("bucket".to_string()),
                key: Some("hosts.csv".to_string()),
            })
            .unwrap();
        assert_eq!(store.location(), "s3://bucket/hosts.csv");
    }

    #[test]
    fn test_factory_missing_secret() {
        let result = Route53Factory.create(&ProviderConfig::Route53 { aws: aws("") });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_wrong_config() {
        let result = S3Factory.create(&StorageConfig::File {
            path: "/tmp/hosts.csv".to_string(),
        });
        assert!(result.is_err());
    }
}
