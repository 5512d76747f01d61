use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScannerError>;

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("scan root does not exist or is not a directory: {0}")]
    InvalidRoot(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ignore engine error: {0}")]
    Ignore(#[from] context_ignore::IgnoreError),
}
