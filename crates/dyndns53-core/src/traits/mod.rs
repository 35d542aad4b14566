//! Collaborator traits for the dyndns53 service
//!
//! - [`ZoneClient`]: Read and mutate address records at the DNS provider
//! - [`BlobStore`]: Fetch and store the credential database object

pub mod blob_store;
pub mod zone_client;

pub use blob_store::{BlobStore, BlobStoreFactory};
pub use zone_client::{
    AddressRecord, DEFAULT_TTL, HostedZone, RecordType, UpdateResult, ZoneClient,
    ZoneClientFactory,
};
