// # Tracing Decorators
//
// Wrappers that put every collaborator call inside a span and log its
// outcome and latency, so backends stay free of logging boilerplate.
//
// ```text
// Reconciler ──▶ TracedZoneClient ──▶ Route53ZoneClient
// CredentialStore ──▶ TracedBlobStore ──▶ S3BlobStore
// ```

use async_trait::async_trait;
use std::time::Instant;
use tracing::{Instrument, debug, info_span, warn};

use crate::Error;
use crate::traits::{AddressRecord, BlobStore, HostedZone, RecordType, ZoneClient};

/// Log the outcome of a call that started at `started`
fn finish<T>(operation: &str, started: Instant, result: &Result<T, Error>) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(_) => debug!(elapsed_ms, "{} succeeded", operation),
        Err(e) => warn!(elapsed_ms, "{} failed: {}", operation, e),
    }
}

/// [`ZoneClient`] decorator that traces every call
pub struct TracedZoneClient<Z> {
    inner: Z,
}

impl<Z: ZoneClient> TracedZoneClient<Z> {
    /// Wrap `inner`
    pub fn new(inner: Z) -> Self {
        Self { inner }
    }

    /// The wrapped client
    pub fn inner(&self) -> &Z {
        &self.inner
    }
}

#[async_trait]
impl<Z: ZoneClient> ZoneClient for TracedZoneClient<Z> {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>, Error> {
        let span = info_span!("zone.find", provider = self.inner.provider_name(), domain);
        async {
            let started = Instant::now();
            let result = self.inner.find_zone(domain).await;
            finish("find_zone", started, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn get_record(
        &self,
        zone: &HostedZone,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<AddressRecord>, Error> {
        let span = info_span!(
            "zone.get_record",
            provider = self.inner.provider_name(),
            zone = %zone.id,
            hostname,
            record_type = %record_type
        );
        async {
            let started = Instant::now();
            let result = self.inner.get_record(zone, hostname, record_type).await;
            finish("get_record", started, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn create_record(&self, zone: &HostedZone, record: &AddressRecord) -> Result<(), Error> {
        let span = info_span!(
            "zone.create_record",
            provider = self.inner.provider_name(),
            zone = %zone.id,
            hostname = %record.name,
            value = %record.value
        );
        async {
            let started = Instant::now();
            let result = self.inner.create_record(zone, record).await;
            finish("create_record", started, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn update_record(
        &self,
        zone: &HostedZone,
        previous: &AddressRecord,
        record: &AddressRecord,
    ) -> Result<(), Error> {
        let span = info_span!(
            "zone.update_record",
            provider = self.inner.provider_name(),
            zone = %zone.id,
            hostname = %record.name,
            previous = %previous.value,
            value = %record.value
        );
        async {
            let started = Instant::now();
            let result = self.inner.update_record(zone, previous, record).await;
            finish("update_record", started, &result);
            result
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

/// [`BlobStore`] decorator that traces every call
pub struct TracedBlobStore<B> {
    inner: B,
}

impl<B: BlobStore> TracedBlobStore<B> {
    /// Wrap `inner`
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// The wrapped store
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for TracedBlobStore<B> {
    async fn fetch(&self) -> Result<Vec<u8>, Error> {
        let span = info_span!("blob.fetch", location = %self.inner.location());
        async {
            let started = Instant::now();
            let result = self.inner.fetch().await;
            if let Ok(data) = &result {
                debug!(bytes = data.len(), "fetched object");
            }
            finish("fetch", started, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn store(&self, data: &[u8]) -> Result<(), Error> {
        let span = info_span!(
            "blob.store",
            location = %self.inner.location(),
            bytes = data.len()
        );
        async {
            let started = Instant::now();
            let result = self.inner.store(data).await;
            finish("store", started, &result);
            result
        }
        .instrument(span)
        .await
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}

// Boxed backends from the registry can be wrapped directly.
#[async_trait]
impl ZoneClient for Box<dyn ZoneClient> {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>, Error> {
        (**self).find_zone(domain).await
    }

    async fn get_record(
        &self,
        zone: &HostedZone,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<AddressRecord>, Error> {
        (**self).get_record(zone, hostname, record_type).await
    }

    async fn create_record(&self, zone: &HostedZone, record: &AddressRecord) -> Result<(), Error> {
        (**self).create_record(zone, record).await
    }

    async fn update_record(
        &self,
        zone: &HostedZone,
        previous: &AddressRecord,
        record: &AddressRecord,
    ) -> Result<(), Error> {
        (**self).update_record(zone, previous, record).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

#[async_trait]
impl BlobStore for Box<dyn BlobStore> {
    async fn fetch(&self) -> Result<Vec<u8>, Error> {
        (**self).fetch().await
    }

    async fn store(&self, data: &[u8]) -> Result<(), Error> {
        (**self).store(data).await
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
