//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Session Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection '{0}' already has a participant")]
    DuplicateConnection(String),

    #[error("connection '{0}' has no participant")]
    NotFound(String),
}

/// User directory (persisted presence) errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("user '{0}' not found in directory")]
    NotFound(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory call timed out after {0} ms")]
    Timeout(u64),
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
