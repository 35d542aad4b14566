// # Built-in Backends
//
// Local implementations of the collaborator traits that need no remote
// service: in-memory zones and blobs, and a file-backed blob store.

pub mod file;
pub mod memory;

pub use file::FileBlobStore;
pub use memory::{MemoryBlobStore, MemoryZoneClient, Mutation};
