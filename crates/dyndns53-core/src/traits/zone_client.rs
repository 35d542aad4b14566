// # Zone Client Trait
//
// Defines the interface for reading and mutating a single address record
// within a hosted zone at a DNS provider.
//
// ## Implementations
//
// - Route 53: `dyndns53-aws` crate
// - In-memory: `dyndns53_core::backend::MemoryZoneClient`
//
// ## Usage
//
// ```rust,ignore
// use dyndns53_core::ZoneClient;
//
// let zone = client.find_zone("example.com").await?.expect("managed zone");
// let record = client.get_record(&zone, "host.example.com", RecordType::A).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Time-to-live applied to every record this service writes
pub const DEFAULT_TTL: u32 = 300;

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordType {
    /// Record type matching the address family of `ip`
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-managed DNS zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Provider-specific zone identifier
    pub id: String,
    /// Zone apex name, without trailing dot
    pub name: String,
}

/// A single-valued address record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Fully-qualified record name, without trailing dot
    pub name: String,
    /// A or AAAA
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// The address value
    pub value: IpAddr,
}

impl AddressRecord {
    /// Create a record for `name` pointing at `value` with the default TTL
    pub fn new(name: impl Into<String>, value: IpAddr) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::for_ip(&value),
            ttl: DEFAULT_TTL,
            value,
        }
    }
}

/// Result of reconciling a record against an observed address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// Record existed with a different address and was replaced
    Updated {
        /// The previous IP address
        previous_ip: IpAddr,
        /// The new IP address
        new_ip: IpAddr,
    },
    /// Record already had the correct IP (no-op)
    Unchanged {
        /// The current IP address
        current_ip: IpAddr,
    },
    /// Record was created (didn't exist before)
    Created {
        /// The created IP address
        new_ip: IpAddr,
    },
}

impl UpdateResult {
    /// Whether the provider was mutated
    pub fn is_mutation(&self) -> bool {
        !matches!(self, UpdateResult::Unchanged { .. })
    }
}

/// Trait for DNS zone client implementations
///
/// A zone client is a thin, stateless wrapper around the provider API.
/// Each method performs one provider call and returns its outcome;
/// deciding *whether* to mutate is owned by the
/// [`Reconciler`](crate::reconciler::Reconciler).
///
/// # Error contract
///
/// - `update_record` must return [`Error::ProviderConflict`](crate::Error::ProviderConflict)
///   when the provider rejects the change because its current state does not
///   match `previous`.
/// - Every other failure maps to another variant and is never retried.
#[async_trait]
pub trait ZoneClient: Send + Sync {
    /// Look up the hosted zone whose apex is exactly `domain`
    ///
    /// Returns `Ok(None)` when the provider manages no such zone.
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>, crate::Error>;

    /// Fetch the address record of `record_type` named `hostname`
    async fn get_record(
        &self,
        zone: &HostedZone,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<AddressRecord>, crate::Error>;

    /// Unconditionally write `record`
    ///
    /// Succeeds whether or not a record of that name and type exists.
    async fn create_record(
        &self,
        zone: &HostedZone,
        record: &AddressRecord,
    ) -> Result<(), crate::Error>;

    /// Replace `previous` with `record`
    ///
    /// The provider applies the change only if its current record matches
    /// `previous` exactly.
    async fn update_record(
        &self,
        zone: &HostedZone,
        previous: &AddressRecord,
        record: &AddressRecord,
    ) -> Result<(), crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone clients from configuration
pub trait ZoneClientFactory: Send + Sync {
    /// Create a ZoneClient instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneClient>, crate::Error>;
}
