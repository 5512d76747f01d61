use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("vector store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("vector store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding dimension mismatch: store holds {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
