//! RocksDB-backed [`KvStore`], the teacher's storage engine of choice.

use crate::{DeleteBatch, KvStore, Result, StoreError};

#[cfg(feature = "rocksdb")]
pub struct RocksStore {
    db: rocksdb::DB,
}

#[cfg(feature = "rocksdb")]
impl RocksStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        let db = rocksdb::DB::open(&opts, path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to open RocksDB store");
            StoreError::Backend(e.to_string())
        })?;
        tracing::info!(path = %path.display(), "opened RocksDB store");
        Ok(Self { db })
    }
}

#[cfg(feature = "rocksdb")]
impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn delete_batch(&self, batch: &DeleteBatch) -> Result<()> {
        let mut write_batch = rocksdb::WriteBatch::default();
        for key in &batch.keys {
            write_batch.delete(key);
        }
        tracing::debug!(keys = batch.keys.len(), "writing delete batch");
        self.db
            .write(write_batch)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn iter_all(&self) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>> {
        let iter = self
            .db
            .iterator(rocksdb::IteratorMode::Start)
            .filter_map(|item| item.ok())
            .map(|(k, v)| (k.to_vec(), v.to_vec()));
        Ok(Box::new(iter))
    }
}

#[cfg(not(feature = "rocksdb"))]
pub struct RocksStore;

#[cfg(not(feature = "rocksdb"))]
impl RocksStore {
    pub fn open(_path: impl AsRef<std::path::Path>) -> Result<Self> {
        Err(StoreError::Backend(
            "rocksdb feature disabled at build time".into(),
        ))
    }
}

#[cfg(test)]
#[cfg(feature = "rocksdb")]
mod tests {
    use super::*;

    #[test]
    fn open_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        store.put(b"key", b"value").unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
    }
}
