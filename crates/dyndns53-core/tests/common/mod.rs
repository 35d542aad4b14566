//! Test doubles and common utilities for contract tests
//!
//! The doubles wrap the in-memory backends and count calls so tests can
//! assert on exactly which provider and storage operations happened.

#![allow(dead_code)]

use async_trait::async_trait;
use dyndns53_core::Error;
use dyndns53_core::backend::MemoryZoneClient;
use dyndns53_core::traits::{AddressRecord, BlobStore, HostedZone, RecordType, ZoneClient};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Parse an address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

/// A zone client that counts every call before delegating to memory zones
#[derive(Clone)]
pub struct CountingZoneClient {
    pub zones: MemoryZoneClient,
    find_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
}

impl CountingZoneClient {
    pub fn new(zones: MemoryZoneClient) -> Self {
        Self {
            zones,
            find_calls: Arc::new(AtomicUsize::new(0)),
            get_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Client managing the single zone `example.com`
    pub fn example_com() -> Self {
        Self::new(MemoryZoneClient::with_zones(["example.com"]))
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Total mutating calls
    pub fn mutation_calls(&self) -> usize {
        self.create_calls() + self.update_calls()
    }
}

#[async_trait]
impl ZoneClient for CountingZoneClient {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>, Error> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.zones.find_zone(domain).await
    }

    async fn get_record(
        &self,
        zone: &HostedZone,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<AddressRecord>, Error> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.zones.get_record(zone, hostname, record_type).await
    }

    async fn create_record(&self, zone: &HostedZone, record: &AddressRecord) -> Result<(), Error> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.zones.create_record(zone, record).await
    }

    async fn update_record(
        &self,
        zone: &HostedZone,
        previous: &AddressRecord,
        record: &AddressRecord,
    ) -> Result<(), Error> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.zones.update_record(zone, previous, record).await
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// A blob store that serves queued responses and can hold a fetch open
pub struct ScriptedBlobStore {
    responses: Mutex<VecDeque<Result<Vec<u8>, Error>>>,
    fetch_calls: AtomicUsize,
    /// Fetches wait for this before returning when gated
    gate: Option<Arc<Notify>>,
    /// Signalled when a fetch has started
    started: Arc<Notify>,
}

impl ScriptedBlobStore {
    pub fn new(responses: Vec<Result<Vec<u8>, Error>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fetch_calls: AtomicUsize::new(0),
            gate: None,
            started: Arc::new(Notify::new()),
        }
    }

    /// Fetches block until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notified each time a fetch begins
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for ScriptedBlobStore {
    async fn fetch(&self) -> Result<Vec<u8>, Error> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::storage("no scripted response left")))
    }

    async fn store(&self, _data: &[u8]) -> Result<(), Error> {
        Err(Error::storage("scripted store is read-only"))
    }

    fn location(&self) -> String {
        "scripted://database".to_string()
    }
}
