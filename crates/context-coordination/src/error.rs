use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinationError>;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("coordination database schema is v{found}, this build supports up to v{supported}; rebuild the index")]
    SchemaNewerThanSupported { found: i64, supported: i64 },

    #[error("resource '{0}' is already locked by another agent")]
    ResourceLocked(String),

    #[error("task '{0}' was already claimed by another agent")]
    TaskAlreadyClaimed(String),

    #[error("agent '{0}' is not registered")]
    UnknownAgent(String),

    #[error("invalid argument: {0}")]
    Validation(String),
}
