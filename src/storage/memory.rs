use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::{ObjectInfo, ObjectStore, not_found};
use crate::error::{DatasetError, DatasetResult};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// In-memory [`ObjectStore`].
///
/// Buckets spring into existence on first put; reads from an unknown bucket fail like a missing
/// object.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> DatasetError {
        DatasetError::storage("memory store lock poisoned")
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, bucket: &str, key: &str) -> DatasetResult<Vec<u8>> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
            .ok_or_else(|| not_found(bucket, key))
    }

    fn stat(&self, bucket: &str, key: &str) -> DatasetResult<ObjectInfo> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| ObjectInfo {
                key: key.to_string(),
                size: o.data.len() as u64,
                last_modified: o.last_modified,
            })
            .ok_or_else(|| not_found(bucket, key))
    }

    fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> DatasetResult<()> {
        let mut objects = self.objects.write().map_err(|_| Self::poisoned())?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn list(&self, bucket: &str) -> DatasetResult<Vec<ObjectInfo>> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        Ok(objects
            .iter()
            .filter(|((b, _), _)| b == bucket)
            .map(|((_, key), o)| ObjectInfo {
                key: key.clone(),
                size: o.data.len() as u64,
                last_modified: o.last_modified,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_and_stat() {
        let store = MemoryObjectStore::new();
        store.put("raw", "a/b.csv", b"x,y\n1,2\n".to_vec()).unwrap();

        assert_eq!(store.get("raw", "a/b.csv").unwrap(), b"x,y\n1,2\n".to_vec());
        assert_eq!(store.stat("raw", "a/b.csv").unwrap().size, 8);
    }

    #[test]
    fn put_overwrites_existing_object() {
        let store = MemoryObjectStore::new();
        store.put("raw", "k", vec![1, 2, 3]).unwrap();
        store.put("raw", "k", vec![9]).unwrap();
        assert_eq!(store.get("raw", "k").unwrap(), vec![9]);
        assert_eq!(store.list("raw").unwrap().len(), 1);
    }

    #[test]
    fn missing_object_is_storage_error() {
        let store = MemoryObjectStore::new();
        let err = store.get("raw", "nope").unwrap_err();
        assert!(matches!(err, DatasetError::StorageIo { .. }));
        assert!(store.stat("raw", "nope").is_err());
    }

    #[test]
    fn list_is_scoped_to_bucket_and_sorted() {
        let store = MemoryObjectStore::new();
        store.put("raw", "b.csv", vec![]).unwrap();
        store.put("raw", "a.csv", vec![]).unwrap();
        store.put("processed", "c.parquet", vec![]).unwrap();

        let keys: Vec<String> = store.list("raw").unwrap().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["a.csv".to_string(), "b.csv".to_string()]);
    }
}
