//! Sparse Merkle trie used by the three named world-state tries
//! (`outputState`, `contractState`, `codeState`). See [`trie::Trie`] for the
//! staging-to-persisted commit path.

mod error;
mod helper;
mod node;
mod node_type;
mod trie;

pub use error::{Result, TrieError};
pub use helper::{common_prefix_length, to_nibbles};
pub use node::{Node, NodeRef, BRANCH_WIDTH};
pub use node_type::NodeKind;
pub use trie::Trie;
