// # Memory Backends
//
// In-memory implementations of ZoneClient and BlobStore.
//
// ## Purpose
//
// Provide fast, dependency-free backends for local runs and tests. The
// zone client enforces the same optimistic update contract as a real
// provider: an update is only applied when the stored record matches the
// caller's `previous` record, otherwise it fails with a conflict.
//
// ## Crash Behavior
//
// All state is lost on restart.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Error;
use crate::traits::{AddressRecord, BlobStore, HostedZone, RecordType, ZoneClient};

/// A mutating call observed by [`MemoryZoneClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `create_record` was called
    Create(AddressRecord),
    /// `update_record` was called
    Update {
        /// The record the caller expected to replace
        previous: AddressRecord,
        /// The replacement record
        record: AddressRecord,
    },
}

#[derive(Debug, Default)]
struct MemoryZones {
    /// zone apex → (record name, type) → record
    zones: HashMap<String, HashMap<(String, RecordType), AddressRecord>>,
    /// Every mutating call, applied or rejected
    mutations: Vec<Mutation>,
    /// Errors returned by upcoming `update_record` calls
    update_failures: VecDeque<Error>,
    /// Errors returned by upcoming `create_record` calls
    create_failures: VecDeque<Error>,
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_lowercase()
}

/// In-memory zone client
///
/// # Example
///
/// ```rust
/// use dyndns53_core::backend::MemoryZoneClient;
/// use dyndns53_core::traits::{AddressRecord, RecordType};
///
/// let zones = MemoryZoneClient::with_zones(["example.com"]);
/// zones.seed_record(AddressRecord::new("host.example.com", "192.0.2.1".parse().unwrap()));
///
/// assert!(zones.record("host.example.com", RecordType::A).is_some());
/// assert!(zones.mutations().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryZoneClient {
    inner: Arc<Mutex<MemoryZones>>,
}

impl MemoryZoneClient {
    /// Create a client with no zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client managing the given zone apexes
    pub fn with_zones<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let client = Self::new();
        for zone in zones {
            client.add_zone(zone.as_ref());
        }
        client
    }

    fn lock(&self) -> MutexGuard<'_, MemoryZones> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an empty zone
    pub fn add_zone(&self, apex: &str) {
        self.lock().zones.entry(normalize(apex)).or_default();
    }

    /// Seed a record without recording a mutation
    ///
    /// The record is placed in the zone whose apex is its name minus the
    /// leftmost label; the zone is created if needed.
    pub fn seed_record(&self, record: AddressRecord) {
        let apex = crate::derive_domain(&normalize(&record.name));
        let key = (normalize(&record.name), record.record_type);
        self.lock().zones.entry(apex).or_default().insert(key, record);
    }

    /// Current record for `name` and `record_type` in any zone
    pub fn record(&self, name: &str, record_type: RecordType) -> Option<AddressRecord> {
        let key = (normalize(name), record_type);
        self.lock()
            .zones
            .values()
            .find_map(|records| records.get(&key).cloned())
    }

    /// Every mutating call made so far, in order
    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    /// Make the next `update_record` call fail with `error`
    pub fn fail_next_update(&self, error: Error) {
        self.lock().update_failures.push_back(error);
    }

    /// Make the next `create_record` call fail with `error`
    pub fn fail_next_create(&self, error: Error) {
        self.lock().create_failures.push_back(error);
    }
}

#[async_trait]
impl ZoneClient for MemoryZoneClient {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>, Error> {
        let apex = normalize(domain);
        let guard = self.lock();
        Ok(guard.zones.contains_key(&apex).then(|| HostedZone {
            id: apex.clone(),
            name: apex,
        }))
    }

    async fn get_record(
        &self,
        zone: &HostedZone,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<AddressRecord>, Error> {
        let guard = self.lock();
        let records = guard
            .zones
            .get(&zone.id)
            .ok_or_else(|| Error::zone_not_found(&zone.name))?;
        Ok(records.get(&(normalize(hostname), record_type)).cloned())
    }

    async fn create_record(&self, zone: &HostedZone, record: &AddressRecord) -> Result<(), Error> {
        let mut guard = self.lock();
        guard.mutations.push(Mutation::Create(record.clone()));

        if let Some(error) = guard.create_failures.pop_front() {
            return Err(error);
        }

        let records = guard
            .zones
            .get_mut(&zone.id)
            .ok_or_else(|| Error::zone_not_found(&zone.name))?;
        records.insert((normalize(&record.name), record.record_type), record.clone());
        Ok(())
    }

    async fn update_record(
        &self,
        zone: &HostedZone,
        previous: &AddressRecord,
        record: &AddressRecord,
    ) -> Result<(), Error> {
        let mut guard = self.lock();
        guard.mutations.push(Mutation::Update {
            previous: previous.clone(),
            record: record.clone(),
        });

        if let Some(error) = guard.update_failures.pop_front() {
            return Err(error);
        }

        let records = guard
            .zones
            .get_mut(&zone.id)
            .ok_or_else(|| Error::zone_not_found(&zone.name))?;

        let key = (normalize(&previous.name), previous.record_type);
        match records.get(&key).cloned() {
            Some(current) if &current == previous => {
                records.remove(&key);
                records.insert((normalize(&record.name), record.record_type), record.clone());
                Ok(())
            }
            Some(current) => Err(Error::conflict(
                "memory",
                format!(
                    "{} is {} (ttl {}), not {} (ttl {})",
                    previous.name, current.value, current.ttl, previous.value, previous.ttl
                ),
            )),
            None => Err(Error::conflict(
                "memory",
                format!("{} {} does not exist", previous.record_type, previous.name),
            )),
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// In-memory blob store
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    object: Arc<Mutex<Option<Vec<u8>>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl MemoryBlobStore {
    /// Create a store with no object
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`
    pub fn with_contents(data: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.set_contents(data);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.object.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the object's contents
    pub fn set_contents(&self, data: impl Into<Vec<u8>>) {
        *self.lock() = Some(data.into());
    }

    /// Current contents, if the object exists
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.lock().clone()
    }

    /// Number of `fetch` calls made so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn fetch(&self) -> Result<Vec<u8>, Error> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .clone()
            .ok_or_else(|| Error::storage("memory object does not exist"))
    }

    async fn store(&self, data: &[u8]) -> Result<(), Error> {
        *self.lock() = Some(data.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory://database".to_string()
    }
}
