//! Sparse Merkle trie over nibble paths.
//!
//! A single [`Trie`] backs one of the world state's three named tries
//! (`outputState`, `contractState`, `codeState`). Inserts and deletes only
//! ever mutate [`NodeRef::Embedded`] subtrees in memory; [`Trie::commit`]
//! walks the dirty frontier bottom-up, hashes each node, writes it through
//! to the [`KvStore`], and returns the new root hash — this is the
//! staging-to-persisted transition the world state drives at block
//! boundaries.

use crate::error::{Result, TrieError};
use crate::helper::{common_prefix_length, to_nibbles};
use crate::node::{Node, NodeRef};
use alephium_persistence::KvStore;

#[derive(Clone)]
pub struct Trie<S: KvStore> {
    root: NodeRef,
    store: std::rc::Rc<S>,
}

impl<S: KvStore> Trie<S> {
    /// Opens a trie at `root` (`None` means empty), reading through `store`.
    pub fn open(root: Option<[u8; 32]>, store: std::rc::Rc<S>) -> Self {
        Self {
            root: root.map(NodeRef::Hash).unwrap_or(NodeRef::Empty),
            store,
        }
    }

    pub fn root_hash(&self) -> Option<[u8; 32]> {
        match self.root {
            NodeRef::Hash(h) => Some(h),
            NodeRef::Empty => None,
            NodeRef::Embedded(_) => {
                unreachable!("root_hash() called before commit — staged trie has no stable hash")
            }
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let path = to_nibbles(key);
        self.get_at(&self.root, &path)
    }

    fn get_at(&self, node_ref: &NodeRef, path: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.load(node_ref)? {
            None => Ok(None),
            Some(node) => match node {
                Node::Leaf { path: leaf_path, value } => {
                    if leaf_path == path {
                        Ok(Some(value))
                    } else {
                        Ok(None)
                    }
                }
                Node::Extension { path: ext_path, child } => {
                    if path.len() >= ext_path.len() && &path[..ext_path.len()] == ext_path.as_slice() {
                        self.get_at(&child, &path[ext_path.len()..])
                    } else {
                        Ok(None)
                    }
                }
                Node::Branch { children, value } => {
                    if path.is_empty() {
                        Ok(value)
                    } else {
                        self.get_at(&children[path[0] as usize], &path[1..])
                    }
                }
            },
        }
    }

    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let path = to_nibbles(key);
        let root = std::mem::replace(&mut self.root, NodeRef::Empty);
        self.root = self.insert_at(root, &path, value)?;
        Ok(())
    }

    fn insert_at(&self, node_ref: NodeRef, path: &[u8], value: Vec<u8>) -> Result<NodeRef> {
        match self.load_owned(node_ref)? {
            None => Ok(NodeRef::Embedded(Box::new(Node::Leaf {
                path: path.to_vec(),
                value,
            }))),
            Some(Node::Leaf { path: leaf_path, value: leaf_value }) => {
                if leaf_path.as_slice() == path {
                    return Ok(NodeRef::Embedded(Box::new(Node::Leaf {
                        path: path.to_vec(),
                        value,
                    })));
                }
                self.split_leaf(leaf_path, leaf_value, path.to_vec(), value)
            }
            Some(Node::Extension { path: ext_path, child }) => {
                let shared = common_prefix_length(&ext_path, path);
                if shared == ext_path.len() {
                    let new_child = self.insert_at(child, &path[shared..], value)?;
                    Ok(NodeRef::Embedded(Box::new(Node::Extension {
                        path: ext_path,
                        child: new_child,
                    })))
                } else {
                    self.split_extension(ext_path, child, shared, path.to_vec(), value)
                }
            }
            Some(Node::Branch { mut children, value: branch_value }) => {
                if path.is_empty() {
                    Ok(NodeRef::Embedded(Box::new(Node::Branch {
                        children,
                        value: Some(value),
                    })))
                } else {
                    let idx = path[0] as usize;
                    let existing = std::mem::replace(&mut children[idx], NodeRef::Empty);
                    children[idx] = self.insert_at(existing, &path[1..], value)?;
                    Ok(NodeRef::Embedded(Box::new(Node::Branch {
                        children,
                        value: branch_value,
                    })))
                }
            }
        }
    }

    fn split_leaf(
        &self,
        leaf_path: Vec<u8>,
        leaf_value: Vec<u8>,
        new_path: Vec<u8>,
        new_value: Vec<u8>,
    ) -> Result<NodeRef> {
        let shared = common_prefix_length(&leaf_path, &new_path);
        let mut branch = Node::new_branch();
        if let Node::Branch { children, value } = &mut branch {
            place_in_branch(children, value, &leaf_path[shared..], leaf_value);
            place_in_branch(children, value, &new_path[shared..], new_value);
        }
        Ok(wrap_with_extension(shared, &leaf_path, branch))
    }

    fn split_extension(
        &self,
        ext_path: Vec<u8>,
        ext_child: NodeRef,
        shared: usize,
        new_path: Vec<u8>,
        new_value: Vec<u8>,
    ) -> Result<NodeRef> {
        let mut branch = Node::new_branch();
        if let Node::Branch { children, value } = &mut branch {
            let remainder = &ext_path[shared..];
            if remainder.len() == 1 {
                children[remainder[0] as usize] = ext_child;
            } else {
                children[remainder[0] as usize] = NodeRef::Embedded(Box::new(Node::Extension {
                    path: remainder[1..].to_vec(),
                    child: ext_child,
                }));
            }
            place_in_branch(children, value, &new_path[shared..], new_value);
        }
        Ok(wrap_with_extension(shared, &ext_path, branch))
    }

    /// Removes `key` if present; a no-op if it is absent. Unlike a
    /// canonical Merkle-Patricia trie this never collapses a branch whose
    /// child count drops to one back into an extension — nodes are shaped
    /// for insert/get correctness, not for a minimal on-disk encoding.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let path = to_nibbles(key);
        let root = std::mem::replace(&mut self.root, NodeRef::Empty);
        self.root = self.remove_at(root, &path)?;
        Ok(())
    }

    fn remove_at(&self, node_ref: NodeRef, path: &[u8]) -> Result<NodeRef> {
        match self.load(&node_ref)? {
            None => Ok(node_ref),
            Some(Node::Leaf { path: leaf_path, .. }) => {
                if leaf_path == path {
                    Ok(NodeRef::Empty)
                } else {
                    Ok(node_ref)
                }
            }
            Some(Node::Extension { path: ext_path, child }) => {
                if path.len() >= ext_path.len() && &path[..ext_path.len()] == ext_path.as_slice() {
                    let new_child = self.remove_at(child, &path[ext_path.len()..])?;
                    if new_child.is_empty() {
                        Ok(NodeRef::Empty)
                    } else {
                        Ok(NodeRef::Embedded(Box::new(Node::Extension {
                            path: ext_path,
                            child: new_child,
                        })))
                    }
                } else {
                    Ok(node_ref)
                }
            }
            Some(Node::Branch { mut children, value }) => {
                if path.is_empty() {
                    Ok(NodeRef::Embedded(Box::new(Node::Branch { children, value: None })))
                } else {
                    let idx = path[0] as usize;
                    let existing = std::mem::replace(&mut children[idx], NodeRef::Empty);
                    children[idx] = self.remove_at(existing, &path[1..])?;
                    Ok(NodeRef::Embedded(Box::new(Node::Branch { children, value })))
                }
            }
        }
    }

    /// Commits every staged ([`NodeRef::Embedded`]) node bottom-up, writing
    /// its encoding through to the store, and returns the new root hash.
    pub fn commit(&mut self) -> Result<Option<[u8; 32]>> {
        let root = std::mem::replace(&mut self.root, NodeRef::Empty);
        self.root = self.commit_ref(root)?;
        Ok(self.root_hash())
    }

    fn commit_ref(&self, node_ref: NodeRef) -> Result<NodeRef> {
        match node_ref {
            NodeRef::Empty => Ok(NodeRef::Empty),
            NodeRef::Hash(h) => Ok(NodeRef::Hash(h)),
            NodeRef::Embedded(node) => {
                let committed = self.commit_node(*node)?;
                let hash = committed.hash();
                self.store
                    .put(&hash, &committed.encode())
                    .map_err(TrieError::from)?;
                Ok(NodeRef::Hash(hash))
            }
        }
    }

    fn commit_node(&self, node: Node) -> Result<Node> {
        Ok(match node {
            Node::Leaf { path, value } => Node::Leaf { path, value },
            Node::Extension { path, child } => Node::Extension {
                path,
                child: self.commit_ref(child)?,
            },
            Node::Branch { mut children, value } => {
                for child in children.iter_mut() {
                    let taken = std::mem::replace(child, NodeRef::Empty);
                    *child = self.commit_ref(taken)?;
                }
                Node::Branch { children, value }
            }
        })
    }

    fn load(&self, node_ref: &NodeRef) -> Result<Option<Node>> {
        match node_ref {
            NodeRef::Empty => Ok(None),
            NodeRef::Embedded(node) => Ok(Some((**node).clone())),
            NodeRef::Hash(hash) => {
                let bytes = self
                    .store
                    .get(hash)
                    .map_err(TrieError::from)?
                    .ok_or_else(|| TrieError::NodeNotFound(hex::encode(hash)))?;
                Ok(Some(Node::decode(&bytes)?))
            }
        }
    }

    fn load_owned(&self, node_ref: NodeRef) -> Result<Option<Node>> {
        self.load(&node_ref)
    }
}

fn place_in_branch(
    children: &mut [NodeRef; crate::node::BRANCH_WIDTH],
    value: &mut Option<Vec<u8>>,
    path: &[u8],
    leaf_value: Vec<u8>,
) {
    if path.is_empty() {
        *value = Some(leaf_value);
    } else {
        children[path[0] as usize] = NodeRef::Embedded(Box::new(Node::Leaf {
            path: path[1..].to_vec(),
            value: leaf_value,
        }));
    }
}

fn wrap_with_extension(shared: usize, full_path: &[u8], branch: Node) -> NodeRef {
    if shared == 0 {
        NodeRef::Embedded(Box::new(branch))
    } else {
        NodeRef::Embedded(Box::new(Node::Extension {
            path: full_path[..shared].to_vec(),
            child: NodeRef::Embedded(Box::new(branch)),
        }))
    }
}
