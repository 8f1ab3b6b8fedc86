use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrunerError {
    #[error("trie node missing for hash {0:?}")]
    MissingNode([u8; 32]),
    #[error("corrupted trie node: {0}")]
    CorruptedNode(String),
    #[error("storage backend error: {0}")]
    Storage(String),
}

impl From<alephium_persistence::StoreError> for PrunerError {
    fn from(err: alephium_persistence::StoreError) -> Self {
        PrunerError::Storage(err.to_string())
    }
}
