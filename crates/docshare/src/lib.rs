//! # Docshare
//!
//! Access-controlled document storage and sharing.
//!
//! ## Overview
//!
//! Users upload documents and own them exclusively. An owner may share view
//! and download access with other users, revoke it again, and delete the
//! document along with every grant on it. A grant may also allow its holder
//! to sign or verify the document. Grantees never re-share.
//!
//! - **Documents**: validated uploads with a content hash, owned by one user
//! - **Grants**: one per (document, user), created by sharing
//! - **Signatures**: attested by the service key, checked on verification
//! - **Evaluator**: a pure function of (relation, operation) deciding every call
//! - **Sessions**: every operation takes the authenticated caller explicitly
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docshare::{DocumentService, ServiceConfig};
//! use docshare::core::{NewDocument, UserId};
//! use docshare::store::SqliteStore;
//!
//! async fn example() -> docshare::Result<()> {
//!     let store = SqliteStore::open("docshare.db")?;
//!     let service = DocumentService::new(store, ServiceConfig::default());
//!
//!     // Resolve the caller
//!     let alice = service.authenticate(Some("1")).await?;
//!
//!     // Upload and share
//!     let upload = NewDocument::new("contract.pdf", "application/pdf", b"%PDF-1.7".to_vec());
//!     let doc = service.create_document(&alice, upload).await?;
//!     service.share(&alice, doc.id, &UserId::new("2")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `docshare::core` - Domain types, upload validation and the evaluator
//! - `docshare::store` - Storage abstraction, SQLite and in-memory stores

pub mod config;
pub mod dto;
pub mod error;
pub mod service;
pub mod session;

// Re-export component crates
pub use docshare_core as core;
pub use docshare_store as store;

pub use config::ServiceConfig;
pub use dto::{
    DocumentDto, DocumentMetadata, Download, GrantDto, SignatureDto, UserSummary, VerificationDto,
};
pub use error::{ErrorKind, Result, ServiceError};
pub use service::DocumentService;
pub use session::Session;

// Re-export commonly used core types
pub use docshare_core::{
    DocumentId, GrantPermissions, Keypair, NewDocument, Operation, PermissionGrant, UploadPolicy,
    User, UserId, VerificationRequest,
};
