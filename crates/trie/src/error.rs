use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    #[error("trie node not found for hash {0}")]
    NodeNotFound(String),

    #[error("corrupted node encoding: {0}")]
    CorruptedNode(String),

    #[error("storage backend error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, TrieError>;

impl From<alephium_persistence::StoreError> for TrieError {
    fn from(err: alephium_persistence::StoreError) -> Self {
        TrieError::Storage(err.to_string())
    }
}
