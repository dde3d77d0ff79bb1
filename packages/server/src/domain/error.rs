//! Domain error types.

use thiserror::Error;

use super::{ConnectionId, Username};

/// Value object validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("'{0}' is required and cannot be empty")]
    Blank(&'static str),
}

/// Session Registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Empty connection id or username
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValueObjectError),

    /// The username is held by another, still-open connection
    #[error("username '{0}' is already taken")]
    DuplicateUsername(Username),

    /// The connection is not the current connection of any session.
    ///
    /// Expected after multi-tab reassociation; never surfaced to clients.
    #[error("connection '{0}' is not the active connection of any session")]
    NotActive(ConnectionId),
}

/// Conversation Store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Missing or empty required field
    #[error("validation failed: {0}")]
    Validation(#[from] ValueObjectError),

    /// A private message participant was never registered
    #[error("user '{0}' is unknown")]
    UnknownParticipant(Username),
}

/// Transport delivery failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// The target connection is not (or no longer) attached
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    /// The connection's outbound channel is closed
    #[error("push failed: {0}")]
    PushFailed(String),
}
