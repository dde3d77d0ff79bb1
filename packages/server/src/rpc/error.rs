//! JSON-RPC error codes and the mapping from use case errors.

use thiserror::Error;

use crate::{infrastructure::dto::rpc::RpcErrorObject, usecase::UseCaseError};

/// Stable error codes shared with clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    RecipientUnavailable,
}

impl RpcErrorCode {
    pub fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::RecipientUnavailable => -32004,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({})", .code.code())]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(RpcErrorCode::ParseError, format!("Parse error: {detail}"))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(RpcErrorCode::InvalidRequest, format!("Invalid request: {detail}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            RpcErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(RpcErrorCode::InvalidParams, format!("Invalid params: {detail}"))
    }

    /// Details stay in the server log
    pub fn internal() -> Self {
        Self::new(RpcErrorCode::InternalError, "Internal error")
    }
}

impl From<UseCaseError> for RpcError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::Validation(detail) => Self::invalid_params(detail),
            UseCaseError::DuplicateUsername(_) => {
                Self::new(RpcErrorCode::InvalidRequest, e.to_string())
            }
            UseCaseError::RecipientUnavailable(_) => {
                Self::new(RpcErrorCode::RecipientUnavailable, e.to_string())
            }
            UseCaseError::Internal(detail) => {
                tracing::error!("Internal error while handling call: {}", detail);
                Self::internal()
            }
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_params(e)
    }
}

impl From<RpcError> for RpcErrorObject {
    fn from(e: RpcError) -> Self {
        Self {
            code: e.code.code(),
            message: e.message,
        }
    }
}
