//! Property-based tests for the pruning sweep.
//!
//! Reachability safety: every key reachable from a retained root survives
//! `prune`, no matter how much unreachable garbage shares the same store.

use alephium_persistence::{KvStore, MemoryStore};
use alephium_pruner::prune;
use alephium_state::PersistedRoot;
use alephium_trie::Trie;
use proptest::prelude::*;
use std::rc::Rc;

fn trie_from_pairs<S: alephium_persistence::KvStore>(
    store: Rc<S>,
    pairs: &[(Vec<u8>, Vec<u8>)],
) -> Option<[u8; 32]> {
    let mut trie = Trie::open(None, store);
    for (key, value) in pairs {
        trie.insert(key, value.clone()).unwrap();
    }
    trie.commit().unwrap()
}

proptest! {
    #[test]
    fn retained_keys_survive_alongside_arbitrary_unreachable_garbage(
        kept in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..8), prop::collection::vec(any::<u8>(), 1..8)), 1..8),
        garbage in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..8), prop::collection::vec(any::<u8>(), 1..8)), 0..8),
    ) {
        let store = Rc::new(MemoryStore::new());

        let kept_root = trie_from_pairs(store.clone(), &kept);
        // The garbage trie shares the same store but its root is never
        // handed to `prune`, so every node only it reaches is fair game.
        let _garbage_root = trie_from_pairs(store.clone(), &garbage);

        prune(
            store.as_ref(),
            &[PersistedRoot { output_root: kept_root, contract_root: None, code_root: None }],
            None,
        )
        .unwrap();

        let reopened = Trie::open(kept_root, store.clone());
        for (key, value) in &kept {
            prop_assert_eq!(reopened.get(key).unwrap(), Some(value.clone()));
        }
    }

    #[test]
    fn scanned_count_never_exceeds_what_was_actually_stored(
        kept in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..8), prop::collection::vec(any::<u8>(), 1..8)), 0..8),
    ) {
        let store = Rc::new(MemoryStore::new());
        let kept_root = trie_from_pairs(store.clone(), &kept);
        let stored_before = store.iter_all().unwrap().count();

        let report = prune(
            store.as_ref(),
            &[PersistedRoot { output_root: kept_root, contract_root: None, code_root: None }],
            None,
        )
        .unwrap();

        prop_assert_eq!(report.scanned, stored_before);
        prop_assert!(report.deleted <= report.scanned);
    }
}
