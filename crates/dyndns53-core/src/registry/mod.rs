//! Plugin-based backend registry
//!
//! Maps backend type names to factories so the binaries can build a zone
//! client and a blob store from configuration without hardcoded match arms
//! over every backend crate.
//!
//! ## Usage
//!
//! ```rust
//! use dyndns53_core::config::ProviderConfig;
//! use dyndns53_core::registry::BackendRegistry;
//!
//! let registry = BackendRegistry::with_builtins();
//!
//! let config = ProviderConfig::Memory { zones: vec!["example.com".to_string()] };
//! let zones = registry.create_zone_client(&config).unwrap();
//! assert_eq!(zones.provider_name(), "memory");
//! ```
//!
//! ## Registration
//!
//! Backend crates expose a `register` function:
//!
//! ```rust,ignore
//! // In dyndns53-aws
//! pub fn register(registry: &BackendRegistry) {
//!     registry.register_zone_client("route53", Box::new(Route53Factory));
//!     registry.register_blob_store("s3", Box::new(S3Factory));
//! }
//! ```

use crate::backend::{FileBlobStore, MemoryZoneClient};
use crate::config::{ProviderConfig, StorageConfig};
use crate::error::{Error, Result};
use crate::traits::{BlobStore, BlobStoreFactory, ZoneClient, ZoneClientFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of zone client and blob store factories
///
/// Interior mutability lets backend crates register through a shared
/// reference.
#[derive(Default)]
pub struct BackendRegistry {
    /// Registered zone client factories
    zone_clients: RwLock<HashMap<String, Box<dyn ZoneClientFactory>>>,

    /// Registered blob store factories
    blob_stores: RwLock<HashMap<String, Box<dyn BlobStoreFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the backends built into this crate
    ///
    /// Registers the `memory` zone client and the `file` blob store.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_zone_client("memory", Box::new(MemoryZoneClientFactory));
        registry.register_blob_store("file", Box::new(FileBlobStoreFactory));
        registry
    }

    /// Register a zone client factory under `name`
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_zone_client(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ZoneClientFactory>,
    ) {
        self.zone_clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Register a blob store factory under `name`
    pub fn register_blob_store(&self, name: impl Into<String>, factory: Box<dyn BlobStoreFactory>) {
        self.blob_stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Create a zone client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneClient>)`: Created client
    /// - `Err(Error::Config)`: If the provider type is not registered
    /// - `Err(Error)`: If the factory rejects the configuration
    pub fn create_zone_client(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneClient>> {
        let provider_type = config.type_name();
        let factories = self
            .zone_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = factories
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a blob store from configuration
    pub fn create_blob_store(&self, config: &StorageConfig) -> Result<Box<dyn BlobStore>> {
        let storage_type = config.type_name();
        let factories = self
            .blob_stores
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = factories
            .get(storage_type)
            .ok_or_else(|| Error::config(format!("Unknown storage type: {}", storage_type)))?;

        factory.create(config)
    }

    /// List registered provider types
    pub fn list_zone_clients(&self) -> Vec<String> {
        let factories = self
            .zone_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// List registered storage types
    pub fn list_blob_stores(&self) -> Vec<String> {
        let factories = self
            .blob_stores
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_zone_client(&self, name: &str) -> bool {
        self.zone_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Check if a storage type is registered
    pub fn has_blob_store(&self, name: &str) -> bool {
        self.blob_stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

/// Builds [`MemoryZoneClient`]s from `ProviderConfig::Memory`
struct MemoryZoneClientFactory;

impl ZoneClientFactory for MemoryZoneClientFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneClient>> {
        match config {
            ProviderConfig::Memory { zones } => Ok(Box::new(MemoryZoneClient::with_zones(zones))),
            other => Err(Error::config(format!(
                "memory factory cannot build a {} provider",
                other.type_name()
            ))),
        }
    }
}

/// Builds [`FileBlobStore`]s from `StorageConfig::File`
struct FileBlobStoreFactory;

impl BlobStoreFactory for FileBlobStoreFactory {
    fn create(&self, config: &StorageConfig) -> Result<Box<dyn BlobStore>> {
        match config {
            StorageConfig::File { path } => Ok(Box::new(FileBlobStore::new(path))),
            other => Err(Error::config(format!(
                "file factory cannot build {} storage",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AwsConfig;

    struct RejectingFactory;

    impl ZoneClientFactory for RejectingFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ZoneClient>> {
            Err(Error::config("rejected"))
        }
    }

    fn aws() -> AwsConfig {
        AwsConfig {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = BackendRegistry::new();
        assert!(!registry.has_zone_client("route53"));

        registry.register_zone_client("route53", Box::new(RejectingFactory));

        assert!(registry.has_zone_client("route53"));
        assert_eq!(registry.list_zone_clients(), vec!["route53".to_string()]);
    }

    #[test]
    fn test_builtins() {
        let registry = BackendRegistry::with_builtins();

        assert_eq!(registry.list_zone_clients(), vec!["memory".to_string()]);
        assert_eq!(registry.list_blob_stores(), vec!["file".to_string()]);

        let store = registry
            .create_blob_store(&StorageConfig::File {
                path: "/tmp/hosts.csv".into(),
            })
            .unwrap();
        assert_eq!(store.location(), "file:///tmp/hosts.csv");
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let registry = BackendRegistry::with_builtins();

        let err = registry
            .create_zone_client(&ProviderConfig::Route53 { aws: aws() })
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));

        let err = registry
            .create_blob_store(&StorageConfig::S3 {
                aws: aws(),
                bucket: None,
                key: None,
            })
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unknown storage type: s3"));
    }
}
