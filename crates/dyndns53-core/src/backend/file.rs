// # File Blob Store
//
// Local-file implementation of BlobStore.
//
// ## Purpose
//
// Lets the daemon and the admin CLI run against a credential database on
// local disk instead of a remote bucket.
//
// ## Crash Safety
//
// - Atomic writes: new contents go to a temporary file which is then renamed
//   over the database, so readers never observe a half-written table.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::BlobStore;

/// File-backed blob store
///
/// # Example
///
/// ```rust,no_run
/// use dyndns53_core::backend::FileBlobStore;
/// use dyndns53_core::traits::BlobStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileBlobStore::new("/var/lib/dyndns53/hosts.csv");
///
///     store.store(b"host.example.com,secret\n").await?;
///     let data = store.fetch().await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    /// Create a store for the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn fetch(&self) -> Result<Vec<u8>, Error> {
        fs::read(&self.path).await.map_err(|e| {
            Error::storage(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }

    async fn store(&self, data: &[u8]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::storage(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(data).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::storage(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Database written to file: {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        format!("file://{}", self.path.display())
    }
}
