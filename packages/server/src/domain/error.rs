//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id must be at most {max} characters")]
    RoomIdTooLong { max: usize },

    #[error("user id must not be empty")]
    UserIdEmpty,

    #[error("message id must not be empty")]
    MessageIdEmpty,

    #[error("username must not be empty")]
    UsernameEmpty,

    #[error("message text must not be empty")]
    MessageTextEmpty,

    #[error("file metadata field '{0}' must not be empty")]
    FileFieldEmpty(&'static str),
}

/// Document operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("unknown document operation '{0}'")]
    UnknownOperation(String),

    #[error("insert operation requires 'text'")]
    MissingText,

    #[error("delete operation requires 'length'")]
    MissingLength,
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Snapshot persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("persistence worker is not running")]
    WorkerStopped,
}

/// Identity verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    #[error("missing required claim: {0}")]
    MissingClaim(&'static str),
}
