// # dyndns53-core
//
// Core library for the dyndns53 dynamic DNS update service.
//
// ## Architecture Overview
//
// - **ZoneClient**: Trait for reading and mutating address records at a DNS provider
// - **BlobStore**: Trait for the durable object holding the credential database
// - **Reconciler**: Brings a hostname's record in line with an observed address
// - **CredentialStore**: Lazily loaded, atomically published hostname → secret table
// - **BackendRegistry**: Plugin-based registry of zone client and blob store factories
//
// Network-facing implementations (Route 53, S3) live in `dyndns53-aws`; the
// HTTP surface lives in `dyndns53d` and database administration in
// `dyndns53-admin`.

pub mod backend;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod instrument;
pub mod reconciler;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{AwsConfig, ProviderConfig, StorageConfig};
pub use credentials::CredentialStore;
pub use domain::derive_domain;
pub use error::{Error, Result};
pub use instrument::{TracedBlobStore, TracedZoneClient};
pub use reconciler::Reconciler;
pub use registry::BackendRegistry;
pub use traits::{AddressRecord, BlobStore, HostedZone, RecordType, UpdateResult, ZoneClient};
