//! Store trait: the abstract interface for document, grant and signature
//! persistence.
//!
//! This trait allows the service to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use docshare_core::{
    AccessState, Document, DocumentId, DocumentMeta, GrantPermissions, ListedDocument,
    NewDocument, PermissionGrant, SignatureRecord, User, UserId, VerificationRecord,
};

use crate::error::Result;

/// Result of inserting a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// User was inserted.
    Inserted,
    /// A user with this id already exists (idempotent - not an error).
    AlreadyExists,
}

/// Result of recording a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantInsert {
    /// The grant was created.
    Inserted(PermissionGrant),
    /// A grant for this (document, grantee) pair already exists.
    AlreadyExists,
    /// The grantee owns the document.
    OwnerGrant,
    /// The document does not exist (or was deleted concurrently).
    DocumentMissing,
}

/// Result of recording a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureInsert {
    /// The signature was stored with a fresh id.
    Inserted(SignatureRecord),
    /// The signer has already signed this document.
    AlreadySigned,
    /// The document does not exist (or was deleted concurrently).
    DocumentMissing,
}

/// Result of deleting a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    /// The document, its grants, signatures and verifications were removed.
    Deleted {
        /// How many grants went with it.
        grants_removed: usize,
    },
    /// No document with this id.
    NotFound,
}

/// The Store trait: async interface for docshare persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic writes**: `insert_document`, `insert_grant`, `delete_grant` and
///   `delete_document` each either fully apply or leave no trace.
/// - **Unique grants**: inserting a second grant for the same pair returns
///   `AlreadyExists`, even under concurrent callers. The owner never holds
///   a grant on their own document.
/// - **Unique signatures**: one signature per (document, signer).
/// - **Cascade**: `delete_document` removes every grant, signature and
///   verification for the document.
/// - **Ordering**: `list_visible_to` returns newest uploads first; ties are
///   broken by descending id. Each document appears once.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a user record.
    ///
    /// Fails with `Conflict` if the email belongs to a different user.
    async fn insert_user(&self, user: &User) -> Result<InsertResult>;

    /// Get a user by id.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Find a user by email, case-insensitively.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Document Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a new document owned by `owner`.
    ///
    /// Assigns a fresh id. The owner must exist.
    async fn insert_document(
        &self,
        owner: &UserId,
        upload: &NewDocument,
        uploaded_at: i64,
    ) -> Result<Document>;

    /// Get a document including its content.
    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>>;

    /// Get a document's metadata without loading its content.
    async fn get_document_meta(&self, id: DocumentId) -> Result<Option<DocumentMeta>>;

    /// Documents owned by `user` or granted to `user`, with the viewer's
    /// grant time and signing status.
    async fn list_visible_to(&self, user: &UserId) -> Result<Vec<ListedDocument>>;

    /// Delete a document and all of its grants.
    async fn delete_document(&self, id: DocumentId) -> Result<DeleteResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Grant Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a grant for `(document_id, grantee)`.
    ///
    /// The grantee must exist. Returns `OwnerGrant` if the grantee owns the
    /// document. Whether the caller may share is not checked here.
    async fn insert_grant(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
        permissions: GrantPermissions,
        granted_at: i64,
    ) -> Result<GrantInsert>;

    /// Delete the grant for `(document_id, grantee)`.
    ///
    /// Returns whether a grant was removed.
    async fn delete_grant(&self, document_id: DocumentId, grantee: &UserId) -> Result<bool>;

    /// Get the grant for `(document_id, grantee)`.
    async fn get_grant(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
    ) -> Result<Option<PermissionGrant>>;

    /// All grants for a document, oldest first.
    async fn list_grants(&self, document_id: DocumentId) -> Result<Vec<PermissionGrant>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Signature Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a signature. The record's id is ignored and a fresh one
    /// assigned. The signer must exist.
    async fn insert_signature(&self, signature: &SignatureRecord) -> Result<SignatureInsert>;

    /// All signatures on a document, oldest first.
    async fn list_signatures(&self, document_id: DocumentId) -> Result<Vec<SignatureRecord>>;

    /// Store a verification with a fresh id.
    ///
    /// Returns `None` if the document does not exist.
    async fn insert_verification(
        &self,
        verification: &VerificationRecord,
    ) -> Result<Option<VerificationRecord>>;

    /// All verifications of a document, oldest first.
    async fn list_verifications(&self, document_id: DocumentId)
        -> Result<Vec<VerificationRecord>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Whether a grant exists for `(document_id, grantee)`.
    fn grant_exists(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Load the grantees of a document for the evaluator.
    fn access_state(
        &self,
        document_id: DocumentId,
    ) -> impl std::future::Future<Output = Result<AccessState>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn grant_exists(&self, document_id: DocumentId, grantee: &UserId) -> Result<bool> {
        Ok(self.get_grant(document_id, grantee).await?.is_some())
    }

    async fn access_state(&self, document_id: DocumentId) -> Result<AccessState> {
        let grants = self.list_grants(document_id).await?;
        Ok(AccessState::from_grants(document_id, &grants))
    }
}
