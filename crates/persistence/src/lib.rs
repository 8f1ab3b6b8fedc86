//! Raw key-value store boundary.
//!
//! This crate is deliberately thin: the spec treats "a trie-backed store"
//! as an assumed collaborator (§1), and only the pruner (§6, §9) needs a
//! concrete handle to it — a byte iterator plus batched delete-by-key. The
//! trie crate commits through the same [`KvStore`] trait.

mod rocks;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A batch of key deletions, applied atomically by [`KvStore::delete_batch`].
#[derive(Debug, Default, Clone)]
pub struct DeleteBatch {
    pub keys: Vec<Vec<u8>>,
}

impl DeleteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: Vec<u8>) {
        self.keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The raw key→value byte store boundary named by spec §6: `getContract`,
/// `createContractUnsafe` etc. build on top of this through the trie crate;
/// the pruner iterates it directly.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
    fn delete_batch(&self, batch: &DeleteBatch) -> Result<()>;

    /// Iterates every key-value pair in the store. The pruner streams this
    /// in bounded-size batches (see `alephium-config::PRUNER_BATCH_SIZE`)
    /// rather than materializing the whole store at once.
    fn iter_all(&self) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>>;
}

pub use rocks::RocksStore;

/// An in-memory [`KvStore`] used by tests and by the emulator's scratch
/// staging world state, which must never touch persistent storage.
#[derive(Default)]
pub struct MemoryStore {
    map: std::sync::RwLock<std::collections::BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.map
            .write()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete_batch(&self, batch: &DeleteBatch) -> Result<()> {
        let mut map = self.map.write().unwrap();
        for key in &batch.keys {
            map.remove(key);
        }
        Ok(())
    }

    fn iter_all(&self) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>> {
        let snapshot: Vec<_> = self
            .map
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_put_get_delete() {
        let store = MemoryStore::new();
        store.put(b"k1", b"v1").unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));

        let mut batch = DeleteBatch::new();
        batch.push(b"k1".to_vec());
        store.delete_batch(&batch).unwrap();
        assert_eq!(store.get(b"k1").unwrap(), None);
    }

    #[test]
    fn iter_all_sees_every_entry() {
        let store = MemoryStore::new();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();
        let mut seen: Vec<_> = store.iter_all().unwrap().collect();
        seen.sort();
        assert_eq!(seen, vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]);
    }
}
