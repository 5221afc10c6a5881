//! Use case error types.

use thiserror::Error;

use crate::domain::ValueObjectError;

/// Why a `join-chat` was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// Carries the cause, from either field validation or frame decoding.
    #[error("invalid join payload: {0}")]
    InvalidJoinPayload(String),

    #[error("connection '{0}' has already joined")]
    DuplicateConnection(String),

    #[error("user '{0}' is not known to the directory")]
    UnknownUser(String),
}

/// Why an HTTP-posted message was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostMessageError {
    #[error("Message text required.")]
    TextRequired,

    #[error("invalid message: {0}")]
    Invalid(ValueObjectError),

    #[error("chat room is unavailable")]
    Unavailable,
}
