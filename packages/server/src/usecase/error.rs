//! UseCase errors.

use thiserror::Error;

use crate::domain::{RegistryError, StoreError, ValueObjectError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    /// Missing, empty or malformed input
    #[error("{0}")]
    Validation(String),

    /// Registration conflict; the caller may retry with another name
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Private message recipient cannot be resolved to a connection
    #[error("Recipient '{0}' not found or offline")]
    RecipientUnavailable(String),

    /// Unexpected failure while handling
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValueObjectError> for UseCaseError {
    fn from(e: ValueObjectError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<RegistryError> for UseCaseError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidInput(e) => Self::Validation(e.to_string()),
            RegistryError::DuplicateUsername(username) => {
                Self::DuplicateUsername(username.as_str().to_string())
            }
            RegistryError::NotActive(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for UseCaseError {
    fn from(e: StoreError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<serde_json::Error> for UseCaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
