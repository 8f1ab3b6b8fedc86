//! Node shapes of the sparse Merkle trie and their canonical byte encoding.
//!
//! Every node hashes to its storage key via [`alephium_cryptography::blake2b_256`]
//! once committed; an uncommitted node lives only in the staging overlay as
//! [`NodeRef::Embedded`].

use crate::error::{Result, TrieError};
use crate::node_type::NodeKind;
use alephium_cryptography::blake2b_256;

pub const BRANCH_WIDTH: usize = 16;

/// A reference to a child node: either resolved to its hash (committed) or
/// still held in memory (staged, not yet written through to the store).
#[derive(Debug, Clone)]
pub enum NodeRef {
    Empty,
    Hash([u8; 32]),
    Embedded(Box<Node>),
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Leaf {
        path: Vec<u8>,
        value: Vec<u8>,
    },
    Extension {
        path: Vec<u8>,
        child: NodeRef,
    },
    Branch {
        children: [NodeRef; BRANCH_WIDTH],
        value: Option<Vec<u8>>,
    },
}

impl Node {
    pub fn new_branch() -> Self {
        Node::Branch {
            children: std::array::from_fn(|_| NodeRef::Empty),
            value: None,
        }
    }

    /// Hashes the node's canonical encoding. Every child [`NodeRef`] must
    /// already be [`NodeRef::Hash`] or [`NodeRef::Empty`] — callers commit
    /// bottom-up so this invariant always holds.
    pub fn hash(&self) -> [u8; 32] {
        blake2b_256(&self.encode())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Node::Leaf { path, value } => {
                out.push(NodeKind::Leaf as u8);
                encode_path(&mut out, path);
                encode_bytes(&mut out, value);
            }
            Node::Extension { path, child } => {
                out.push(NodeKind::Extension as u8);
                encode_path(&mut out, path);
                encode_child(&mut out, child);
            }
            Node::Branch { children, value } => {
                out.push(NodeKind::Branch as u8);
                match value {
                    Some(v) => {
                        out.push(1);
                        encode_bytes(&mut out, v);
                    }
                    None => out.push(0),
                }
                for child in children {
                    encode_child(&mut out, child);
                }
            }
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(TrieError::CorruptedNode("empty node encoding".into()));
        }
        let kind = NodeKind::from_byte(bytes[0])
            .ok_or_else(|| TrieError::CorruptedNode(format!("unknown node tag {}", bytes[0])))?;
        let mut cursor = Cursor { bytes, pos: 1 };
        match kind {
            NodeKind::Empty => Err(TrieError::CorruptedNode("standalone empty node".into())),
            NodeKind::Leaf => {
                let path = cursor.take_path()?;
                let value = cursor.take_bytes()?;
                Ok(Node::Leaf { path, value })
            }
            NodeKind::Extension => {
                let path = cursor.take_path()?;
                let child = cursor.take_child()?;
                Ok(Node::Extension { path, child })
            }
            NodeKind::Branch => {
                let has_value = cursor.take_u8()?;
                let value = if has_value == 1 {
                    Some(cursor.take_bytes()?)
                } else {
                    None
                };
                let mut children: [NodeRef; BRANCH_WIDTH] = std::array::from_fn(|_| NodeRef::Empty);
                for slot in children.iter_mut() {
                    *slot = cursor.take_child()?;
                }
                Ok(Node::Branch { children, value })
            }
        }
    }
}

fn encode_path(out: &mut Vec<u8>, path: &[u8]) {
    out.extend_from_slice(&(path.len() as u32).to_le_bytes());
    out.extend_from_slice(path);
}

fn encode_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

fn encode_child(out: &mut Vec<u8>, child: &NodeRef) {
    match child {
        NodeRef::Empty => out.push(0),
        NodeRef::Hash(h) => {
            out.push(1);
            out.extend_from_slice(h);
        }
        NodeRef::Embedded(_) => {
            unreachable!("encode() is only called on committed nodes")
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take_u8(&mut self) -> Result<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| TrieError::CorruptedNode("truncated encoding".into()))?;
        self.pos += 1;
        Ok(b)
    }

    fn take_u32(&mut self) -> Result<u32> {
        let end = self.pos + 4;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| TrieError::CorruptedNode("truncated length prefix".into()))?;
        self.pos = end;
        Ok(u32::from_le_bytes(slice.try_into().unwrap()))
    }

    fn take_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.take_u32()? as usize;
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| TrieError::CorruptedNode("truncated byte field".into()))?;
        self.pos = end;
        Ok(slice.to_vec())
    }

    fn take_path(&mut self) -> Result<Vec<u8>> {
        self.take_bytes()
    }

    fn take_child(&mut self) -> Result<NodeRef> {
        match self.take_u8()? {
            0 => Ok(NodeRef::Empty),
            1 => {
                let end = self.pos + 32;
                let slice = self
                    .bytes
                    .get(self.pos..end)
                    .ok_or_else(|| TrieError::CorruptedNode("truncated child hash".into()))?;
                self.pos = end;
                let mut hash = [0u8; 32];
                hash.copy_from_slice(slice);
                Ok(NodeRef::Hash(hash))
            }
            tag => Err(TrieError::CorruptedNode(format!("unknown child tag {tag}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_round_trips_through_encoding() {
        let node = Node::Leaf {
            path: vec![1, 2, 3],
            value: b"value".to_vec(),
        };
        let decoded = Node::decode(&node.encode()).unwrap();
        match decoded {
            Node::Leaf { path, value } => {
                assert_eq!(path, vec![1, 2, 3]);
                assert_eq!(value, b"value".to_vec());
            }
            _ => panic!("wrong node kind"),
        }
    }

    #[test]
    fn branch_round_trips_with_committed_children() {
        let mut node = Node::new_branch();
        if let Node::Branch { children, value } = &mut node {
            children[0] = NodeRef::Hash([7u8; 32]);
            *value = Some(b"branch-value".to_vec());
        }
        let decoded = Node::decode(&node.encode()).unwrap();
        match decoded {
            Node::Branch { children, value } => {
                assert_eq!(value, Some(b"branch-value".to_vec()));
                assert!(matches!(children[0], NodeRef::Hash(h) if h == [7u8; 32]));
                assert!(children[1].is_empty());
            }
            _ => panic!("wrong node kind"),
        }
    }
}
