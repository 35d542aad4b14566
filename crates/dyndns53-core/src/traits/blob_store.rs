// # Blob Store Trait
//
// Defines the interface to the durable object holding the credential
// database. The store addresses exactly one object; where that object lives
// (bucket and key, or a local path) is part of the implementation's
// configuration.
//
// ## Implementations
//
// - S3: `dyndns53-aws` crate
// - File: `dyndns53_core::backend::FileBlobStore`
// - In-memory: `dyndns53_core::backend::MemoryBlobStore`

use async_trait::async_trait;

/// Trait for blob store implementations
///
/// Contents are opaque bytes; no validation happens at this layer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the full contents of the object
    async fn fetch(&self) -> Result<Vec<u8>, crate::Error>;

    /// Replace the object's contents with `data`
    async fn store(&self, data: &[u8]) -> Result<(), crate::Error>;

    /// Human-readable location of the object (for logging)
    fn location(&self) -> String;
}

/// Helper trait for constructing blob stores from configuration
pub trait BlobStoreFactory: Send + Sync {
    /// Create a BlobStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StorageConfig,
    ) -> Result<Box<dyn BlobStore>, crate::Error>;
}
