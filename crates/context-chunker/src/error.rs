use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChunkerError>;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("unsupported language for AST parsing: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to parse source as {0}")]
    ParseFailed(String),
}

impl ChunkerError {
    #[must_use]
    pub fn unsupported_language(lang: &str) -> Self {
        Self::UnsupportedLanguage(lang.to_string())
    }
}
