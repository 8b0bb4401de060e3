//! # Docshare Core
//!
//! Pure primitives for docshare: users, documents, permission grants,
//! upload validation, signature records and the access-control evaluator.
//!
//! This crate contains no I/O, no storage, no networking. Every decision it
//! makes is a function of its inputs.
//!
//! ## Key Types
//!
//! - [`Document`] / [`DocumentMeta`] - A stored document, with and without its blob
//! - [`NewDocument`] - An upload request before it is persisted
//! - [`PermissionGrant`] - Delegated access for one user, with optional sign/verify rights
//! - [`SignatureRecord`] / [`VerificationRecord`] - Attested signatures and their checks
//! - [`AccessState`] - The grantees of a single document
//! - [`Operation`] / [`Relation`] - Inputs to [`can_access`]
//!
//! ## Access Rules
//!
//! The owner may do everything. A grantee may view and download, and sign
//! or verify when the grant says so. Nobody else may do anything. See [`policy`] module.

pub mod crypto;
pub mod document;
pub mod error;
pub mod grant;
pub mod policy;
pub mod signature;
pub mod types;
pub mod user;
pub mod validation;

pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
pub use document::{
    format_size, Document, DocumentMeta, ListedDocument, NewDocument, DEFAULT_CATEGORY,
};
pub use error::{CoreError, ValidationError};
pub use grant::{GrantPermissions, PermissionGrant};
pub use policy::{can_access, decide, AccessState, Operation, Relation};
pub use signature::{
    latest_verification, validate_signature_data, verify_document, SignatureCheck,
    SignatureRecord, VerificationOutcome, VerificationRecord, VerificationRequest,
};
pub use types::{ContentHash, DocumentId, GrantId, SignatureId, UserId, VerificationId};
pub use user::{normalize_email, User};
pub use validation::{validate_upload, UploadPolicy, DEFAULT_MAX_SIZE_BYTES};
