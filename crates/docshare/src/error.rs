//! Error types for the document service.

use docshare_core::{CoreError, ValidationError};
use docshare_store::StoreError;
use thiserror::Error;

/// Errors that can occur during service operations.
///
/// Everything except `Store` and `Integrity` is a policy outcome the caller
/// is expected to handle.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed or violates an upload rule.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No valid session.
    #[error("not authenticated")]
    Unauthenticated,

    /// The caller may not perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation would duplicate existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Stored content no longer matches its recorded hash.
    #[error("integrity error: {0}")]
    Integrity(CoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Coarse classification of a [`ServiceError`] for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// The conventional HTTP status for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Store(_) | ServiceError::Integrity(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for `self.kind().status_code()`.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
