//! Walks a trie from a root hash, collecting every node hash reachable
//! from it. Used both for the retained block window (pruned after the
//! window slides past it) and for the code trie (never pruned by block
//! age — see [`crate::prune::prune`]).

use crate::error::PrunerError;
use alephium_persistence::KvStore;
use alephium_trie::{Node, NodeRef};
use std::collections::HashSet;

/// Adds every node hash reachable from `root` to `visited`. A hash already
/// in `visited` is assumed fully explored and its subtree is not
/// revisited — safe because two trie nodes with the same hash have the
/// same content, and therefore the same children.
pub fn walk<S: KvStore>(
    store: &S,
    root: [u8; 32],
    visited: &mut HashSet<[u8; 32]>,
) -> Result<(), PrunerError> {
    let mut stack = vec![root];
    while let Some(hash) = stack.pop() {
        if !visited.insert(hash) {
            continue;
        }
        let bytes = store
            .get(&hash)?
            .ok_or(PrunerError::MissingNode(hash))?;
        let node = Node::decode(&bytes).map_err(|e| PrunerError::CorruptedNode(e.to_string()))?;
        push_children(&node, &mut stack);
    }
    Ok(())
}

fn push_children(node: &Node, stack: &mut Vec<[u8; 32]>) {
    match node {
        Node::Leaf { .. } => {}
        Node::Extension { child, .. } => push_ref(child, stack),
        Node::Branch { children, .. } => {
            for child in children {
                push_ref(child, stack);
            }
        }
    }
}

fn push_ref(node_ref: &NodeRef, stack: &mut Vec<[u8; 32]>) {
    if let NodeRef::Hash(hash) = node_ref {
        stack.push(*hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_persistence::MemoryStore;
    use alephium_trie::Trie;
    use std::rc::Rc;

    #[test]
    fn walk_visits_every_node_of_a_small_trie() {
        let store = Rc::new(MemoryStore::new());
        let mut trie = Trie::open(None, store.clone());
        trie.insert(b"alpha", b"1".to_vec()).unwrap();
        trie.insert(b"beta", b"2".to_vec()).unwrap();
        let root = trie.commit().unwrap().unwrap();

        let mut visited = HashSet::new();
        walk(store.as_ref(), root, &mut visited).unwrap();
        assert!(visited.contains(&root));
        assert!(visited.len() >= 1);
    }

    #[test]
    fn walk_fails_on_a_hash_with_no_backing_node() {
        let store = Rc::new(MemoryStore::new());
        let mut visited = HashSet::new();
        assert!(matches!(
            walk(store.as_ref(), [9u8; 32], &mut visited),
            Err(PrunerError::MissingNode([9, ..]))
        ));
    }
}
