use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scanner error: {0}")]
    Scanner(#[from] context_scanner::ScannerError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] context_vector_store::VectorStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] context_embeddings::EmbeddingError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    Validation(String),
}
