//! Object-store collaborator.
//!
//! The core only needs get/stat/put/list on named objects within named buckets. Puts are atomic
//! per object: a concurrent reader sees either the previous or the new bytes, never a mix. There
//! is no versioning or locking beyond that.
//!
//! - [`MemoryObjectStore`]: process-local map, used by tests and embedded callers
//! - [`FsObjectStore`]: one directory per bucket under a root, temp-file + rename puts

mod fs;
mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DatasetResult;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

/// Metadata about a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Object key within its bucket.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Named-bucket object storage.
///
/// Every method either succeeds or fails with [`crate::DatasetError::StorageIo`]; a missing
/// object is a storage failure, not `None`.
pub trait ObjectStore: Send + Sync {
    /// Read a whole object.
    fn get(&self, bucket: &str, key: &str) -> DatasetResult<Vec<u8>>;

    /// Read object metadata without its bytes.
    fn stat(&self, bucket: &str, key: &str) -> DatasetResult<ObjectInfo>;

    /// Create or overwrite an object.
    fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> DatasetResult<()>;

    /// List every object in a bucket, ordered by key.
    fn list(&self, bucket: &str) -> DatasetResult<Vec<ObjectInfo>>;
}

fn not_found(bucket: &str, key: &str) -> crate::DatasetError {
    crate::DatasetError::storage(format!("object '{bucket}/{key}' not found"))
}
