//! Record reconciliation
//!
//! The Reconciler is responsible for:
//! - Resolving the hosted zone for a domain
//! - Reading the current address record for a hostname
//! - Deciding between create, update, and no-op
//! - Recovering from the provider's optimistic-concurrency conflicts
//!
//! ## Decision Flow
//!
//! ```text
//!                    find_zone(domain)
//!                           │
//!               None ───────┼──────── Some(zone)
//!                 │                       │
//!          ZoneNotFound         get_record(zone, hostname)
//!                                         │
//!          ┌──────────────────────────────┼────────────────────────────┐
//!          │ absent                       │ same address               │ different address
//!          ▼                              ▼                            ▼
//!    create_record                    Unchanged                update_record(old → new)
//!      Created                                                         │
//!                                                 Ok ──────────────────┼────── ProviderConflict
//!                                                  │                                  │
//!                                               Updated                     create_record
//!                                                                        (unconditional) → Updated
//! ```
//!
//! Only the conflict case is retried, and only once. All other provider
//! errors propagate to the caller unchanged.

use crate::error::{Error, Result};
use crate::traits::{AddressRecord, RecordType, UpdateResult, ZoneClient};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reconciles a hostname's address record with an observed address
///
/// The reconciler holds no state of its own; everything lives at the
/// provider. It is cheap to clone and safe to share across requests.
#[derive(Clone)]
pub struct Reconciler {
    /// Zone client used for every provider call
    zones: Arc<dyn ZoneClient>,
}

impl Reconciler {
    /// Create a new reconciler over `zones`
    pub fn new(zones: Arc<dyn ZoneClient>) -> Self {
        Self { zones }
    }

    /// Ensure the address record for `hostname` in `domain`'s zone is `ipaddr`
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResult::Created)`: No record existed; one was created
    /// - `Ok(UpdateResult::Unchanged)`: The record already held `ipaddr`
    /// - `Ok(UpdateResult::Updated)`: The record held another address and was replaced
    /// - `Err(Error::ZoneNotFound)`: `domain` is not a hosted zone
    /// - `Err(Error)`: Any other provider failure
    #[tracing::instrument(
        name = "reconcile",
        skip(self),
        fields(provider = self.zones.provider_name())
    )]
    pub async fn reconcile(
        &self,
        domain: &str,
        hostname: &str,
        ipaddr: IpAddr,
    ) -> Result<UpdateResult> {
        let zone = self
            .zones
            .find_zone(domain)
            .await?
            .ok_or_else(|| Error::zone_not_found(domain))?;

        let record_type = RecordType::for_ip(&ipaddr);
        let existing = self.zones.get_record(&zone, hostname, record_type).await?;
        let desired = AddressRecord::new(hostname, ipaddr);

        let Some(existing) = existing else {
            self.zones.create_record(&zone, &desired).await?;
            info!("Created {} record {} -> {}", record_type, hostname, ipaddr);
            return Ok(UpdateResult::Created { new_ip: ipaddr });
        };

        if existing.value == ipaddr {
            debug!("Record {} already has IP {}, skipping update", hostname, ipaddr);
            return Ok(UpdateResult::Unchanged { current_ip: ipaddr });
        }

        match self.zones.update_record(&zone, &existing, &desired).await {
            Ok(()) => {}
            Err(Error::ProviderConflict { provider, message }) => {
                // The provider's view differs from our read; its create
                // path does not depend on the previous value.
                warn!(
                    "Update of {} rejected by {} ({}); retrying as create",
                    hostname, provider, message
                );
                self.zones.create_record(&zone, &desired).await?;
            }
            Err(e) => return Err(e),
        }

        info!("Updated {} -> {} (previous: {})", hostname, ipaddr, existing.value);
        Ok(UpdateResult::Updated {
            previous_ip: existing.value,
            new_ip: ipaddr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryZoneClient;

    #[tokio::test]
    async fn test_reconcile_creates_then_skips() {
        let zones = Arc::new(MemoryZoneClient::with_zones(["example.com"]));
        let reconciler = Reconciler::new(zones.clone());
        let ip: IpAddr = "192.0.2.10".parse().unwrap();

        let first = reconciler
            .reconcile("example.com", "host.example.com", ip)
            .await
            .unwrap();
        let second = reconciler
            .reconcile("example.com", "host.example.com", ip)
            .await
            .unwrap();

        assert_eq!(first, UpdateResult::Created { new_ip: ip });
        assert_eq!(second, UpdateResult::Unchanged { current_ip: ip });
        assert_eq!(zones.mutations().len(), 1);
    }

    #[tokio::test]
    async fn test_ipv6_uses_aaaa_record() {
        let zones = Arc::new(MemoryZoneClient::with_zones(["example.com"]));
        let reconciler = Reconciler::new(zones.clone());
        let ip: IpAddr = "2001:db8::5".parse().unwrap();

        reconciler
            .reconcile("example.com", "host.example.com", ip)
            .await
            .unwrap();

        let record = zones
            .record("host.example.com", RecordType::Aaaa)
            .expect("AAAA record created");
        assert_eq!(record.value, ip);
        assert!(zones.record("host.example.com", RecordType::A).is_none());
    }
}
