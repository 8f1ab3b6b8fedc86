//! State pruning: the raw key-value store backing the world state's three
//! tries keeps every node ever committed unless something deletes it. This
//! crate is that something — it streams the store in bounded batches and
//! deletes any trie node that is neither reachable from the retained
//! block window nor part of the (never-pruned) contract-code trie.
//!
//! A bloom filter, not an exact set, holds the reachable-hash membership
//! test: sized for ~80M hashes at a 1% false-positive rate
//! (`alephium_config::PRUNER_EXPECTED_HASHES`/`PRUNER_FALSE_POSITIVE_RATE`),
//! so the sweep's own memory footprint stays bounded regardless of how
//! large the retained window's trie actually is. A false positive only
//! ever means "kept when it could have been deleted" — see
//! [`prune::prune`]'s safety note.

mod error;
mod prune;
mod reachability;

pub use error::PrunerError;
pub use prune::{prune, PruneReport};
