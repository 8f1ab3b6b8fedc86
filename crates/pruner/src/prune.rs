//! The pruning sweep itself: marks every node reachable from the retained
//! window plus the code trie, then streams the store in bounded batches
//! deleting whatever a bloom filter over that set says is unreachable.
//!
//! Safety: the filter can only ever say "maybe reachable" for a node that
//! is not (a false positive, which just leaves garbage behind), never
//! "definitely unreachable" for a node that is — reachability itself is
//! computed exactly, over a `HashSet`, before a single bit goes into the
//! filter.

use crate::error::PrunerError;
use crate::reachability::walk;
use alephium_config::{PRUNER_BATCH_SIZE, PRUNER_EXPECTED_HASHES, PRUNER_FALSE_POSITIVE_RATE};
use alephium_cryptography::BloomFilter;
use alephium_persistence::{DeleteBatch, KvStore};
use alephium_state::PersistedRoot;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PruneReport {
    pub scanned: usize,
    pub deleted: usize,
}

/// Deletes every node in `store` that is unreachable from `retained_roots`
/// (the `output`/`contract` tries of the last
/// `alephium_config::PRUNER_RETAINED_BLOCKS` blocks) and unreachable from
/// `current_code_root` (the live `codeState` trie, kept in full: deployed
/// code can be referenced by contracts created long before the retained
/// window, so it is never pruned by block age).
///
/// Callers must hold exclusive access to `store` for the duration of this
/// call — see "Concurrency" in the design notes; this crate does not
/// coordinate with any other writer.
pub fn prune<S: KvStore>(
    store: &S,
    retained_roots: &[PersistedRoot],
    current_code_root: Option<[u8; 32]>,
) -> Result<PruneReport, PrunerError> {
    let _span = tracing::info_span!("prune", retained_roots = retained_roots.len()).entered();
    let mut visited = HashSet::new();
    for root in retained_roots {
        if let Some(hash) = root.output_root {
            walk(store, hash, &mut visited)?;
        }
        if let Some(hash) = root.contract_root {
            walk(store, hash, &mut visited)?;
        }
    }
    if let Some(hash) = current_code_root {
        walk(store, hash, &mut visited)?;
    }

    let mut filter = BloomFilter::new(PRUNER_EXPECTED_HASHES, PRUNER_FALSE_POSITIVE_RATE);
    for hash in &visited {
        filter.insert(hash);
    }

    let mut report = PruneReport::default();
    let mut batch = DeleteBatch::new();
    for (key, _value) in store.iter_all()? {
        report.scanned += 1;
        if filter.contains(&key) {
            continue;
        }
        batch.push(key);
        if batch.len() >= PRUNER_BATCH_SIZE {
            tracing::debug!(batch_len = batch.len(), "deleting prune batch");
            report.deleted += batch.len();
            store.delete_batch(&batch)?;
            batch = DeleteBatch::new();
        }
    }
    if !batch.is_empty() {
        tracing::debug!(batch_len = batch.len(), "deleting final prune batch");
        report.deleted += batch.len();
        store.delete_batch(&batch)?;
    }

    tracing::info!(scanned = report.scanned, deleted = report.deleted, "prune sweep completed");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_persistence::MemoryStore;
    use alephium_trie::Trie;
    use std::rc::Rc;

    #[test]
    fn prune_keeps_nodes_reachable_from_the_retained_root() {
        let store = Rc::new(MemoryStore::new());
        let mut trie = Trie::open(None, store.clone());
        trie.insert(b"kept", b"1".to_vec()).unwrap();
        let kept_root = trie.commit().unwrap().unwrap();

        let report = prune(
            store.as_ref(),
            &[PersistedRoot {
                output_root: Some(kept_root),
                contract_root: None,
                code_root: None,
            }],
            None,
        )
        .unwrap();

        assert_eq!(report.deleted, 0);
        assert!(store.get(&kept_root).unwrap().is_some());
    }

    #[test]
    fn prune_deletes_nodes_unreachable_from_any_retained_or_code_root() {
        let store = Rc::new(MemoryStore::new());
        let mut stale = Trie::open(None, store.clone());
        stale.insert(b"stale", b"1".to_vec()).unwrap();
        let stale_root = stale.commit().unwrap().unwrap();

        // A fresh trie sharing the same store, with no reference to the
        // stale root at all: it is exactly the "no longer in any retained
        // block's roots" case the pruner exists for.
        let mut live = Trie::open(None, store.clone());
        live.insert(b"live", b"2".to_vec()).unwrap();
        let live_root = live.commit().unwrap().unwrap();

        let report = prune(
            store.as_ref(),
            &[PersistedRoot {
                output_root: Some(live_root),
                contract_root: None,
                code_root: None,
            }],
            None,
        )
        .unwrap();

        assert_eq!(report.deleted, 1);
        assert!(store.get(&stale_root).unwrap().is_none());
        assert!(store.get(&live_root).unwrap().is_some());
    }

    #[test]
    fn prune_never_deletes_nodes_reachable_from_the_code_root() {
        let store = Rc::new(MemoryStore::new());
        let mut code = Trie::open(None, store.clone());
        code.insert(b"contract-code", b"bytecode".to_vec()).unwrap();
        let code_root = code.commit().unwrap().unwrap();

        let report = prune(store.as_ref(), &[], Some(code_root)).unwrap();

        assert_eq!(report.deleted, 0);
        assert!(store.get(&code_root).unwrap().is_some());
    }
}
