use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("embedding cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding provider rate-limited the request after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("embedding provider returned server error {status} after {attempts} attempts")]
    ServerError { status: u16, attempts: u32 },

    #[error("embedding provider returned an empty result for a non-empty batch")]
    EmptyResponse,

    #[error("embedding provider returned {got} vectors for a batch of {expected}")]
    BatchSizeMismatch { expected: usize, got: usize },
}
