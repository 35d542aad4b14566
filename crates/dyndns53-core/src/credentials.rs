//! Credential store
//!
//! Maps fully-qualified hostnames to the shared secret their update client
//! authenticates with. The table lives in a [`BlobStore`] as a headerless
//! two-column CSV file and is loaded lazily on the first authentication
//! attempt.
//!
//! ## Lifecycle
//!
//! ```text
//!   Empty ──ensure_loaded──▶ (fetch + parse whole table) ──ok──▶ Ready
//!     ▲                                   │
//!     └────────────── any error ──────────┘
//! ```
//!
//! A table is published with a single swap after it has been parsed in
//! full, so readers see either nothing or every entry. Loads are serialized;
//! a caller that waited for a concurrent load re-checks the state before
//! fetching again.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::traits::BlobStore;

#[derive(Debug, Default)]
enum CredentialState {
    #[default]
    Empty,
    Ready(Arc<HashMap<String, String>>),
}

/// Lazily loaded hostname → secret table
pub struct CredentialStore {
    /// Where the serialized table is fetched from
    source: Arc<dyn BlobStore>,
    /// Published table
    state: RwLock<CredentialState>,
    /// Serializes loads
    load_lock: Mutex<()>,
}

impl CredentialStore {
    /// Create an empty store that loads from `source`
    pub fn new(source: Arc<dyn BlobStore>) -> Self {
        Self {
            source,
            state: RwLock::new(CredentialState::Empty),
            load_lock: Mutex::new(()),
        }
    }

    /// Whether a table has been published
    pub async fn is_loaded(&self) -> bool {
        matches!(*self.state.read().await, CredentialState::Ready(_))
    }

    /// Number of entries in the published table
    pub async fn len(&self) -> usize {
        match &*self.state.read().await {
            CredentialState::Ready(table) => table.len(),
            CredentialState::Empty => 0,
        }
    }

    /// Check if no entries are published
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Secret stored for `hostname`, if any
    ///
    /// Does not trigger a load.
    pub async fn lookup(&self, hostname: &str) -> Option<String> {
        match &*self.state.read().await {
            CredentialState::Ready(table) => table.get(hostname).cloned(),
            CredentialState::Empty => None,
        }
    }

    /// Load the table if it has not been loaded yet
    ///
    /// On any fetch or parse failure the store is left empty and the error
    /// is returned. A table with no entries is not published, so the next
    /// call fetches again.
    #[tracing::instrument(name = "credentials.ensure_loaded", skip(self))]
    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded().await {
            return Ok(());
        }

        let _guard = self.load_lock.lock().await;
        if self.is_loaded().await {
            debug!("Credential table loaded by a concurrent caller");
            return Ok(());
        }

        match self.load().await {
            Ok(table) if table.is_empty() => {
                warn!("Credential table at {} has no entries", self.source.location());
                Ok(())
            }
            Ok(table) => {
                info!(
                    "Loaded {} credential(s) from {}",
                    table.len(),
                    self.source.location()
                );
                *self.state.write().await = CredentialState::Ready(Arc::new(table));
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to load credentials from {}: {}",
                    self.source.location(),
                    e
                );
                *self.state.write().await = CredentialState::Empty;
                Err(e)
            }
        }
    }

    /// Check `secret` against the stored secret for `hostname`
    ///
    /// Loads the table first if needed. Secrets are compared exactly.
    pub async fn verify(&self, hostname: &str, secret: &str) -> Result<bool> {
        self.ensure_loaded().await?;

        Ok(match self.lookup(hostname).await {
            Some(stored) => stored == secret,
            None => {
                debug!("No credential entry for {}", hostname);
                false
            }
        })
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        let data = self.source.fetch().await?;
        parse_table(&data)
    }
}

/// Parse a serialized credential table
///
/// One `hostname,secret` record per line, no header row, standard CSV
/// quoting. Blank lines are skipped; any other record with a field count
/// other than two fails the whole table. A later duplicate hostname
/// overrides an earlier one.
pub fn parse_table(data: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut table = HashMap::new();
    for result in reader.records() {
        let record = result?;

        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }

        if record.len() != 2 {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(Error::database(format!(
                "line {}: expected 2 fields (hostname, secret), found {}",
                line,
                record.len()
            )));
        }

        table.insert(record[0].to_string(), record[1].to_string());
    }

    Ok(table)
}
