//! Error types for docshare core.

use thiserror::Error;

/// Core errors that can occur while building domain values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("content hash mismatch: expected {expected}, got {actual}")]
    ContentHashMismatch { expected: String, actual: String },

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,
}

/// Validation errors for uploads, signatures and verification requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file provided")]
    EmptyContent,

    #[error("declared size {declared} does not match content length {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("file of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("invalid file type: {0}")]
    ContentTypeNotAllowed(String),

    #[error("invalid file extension: {0}")]
    ExtensionNotAllowed(String),

    #[error("file name is required")]
    MissingFileName,

    #[error("{field} exceeds maximum length of {max}")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("signature data is required")]
    EmptySignature,

    #[error("signature data of {size} bytes exceeds the {limit} byte limit")]
    SignatureTooLarge { size: usize, limit: usize },
}
