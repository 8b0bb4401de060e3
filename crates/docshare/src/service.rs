//! The DocumentService: the access-controlled API over a store.
//!
//! Every operation resolves the caller's relation to the document and asks
//! the evaluator before touching storage. The store enforces uniqueness and
//! cascades; the service decides who may do what.
//!
//! Signatures are countersigned with the service's attestation key. Records
//! attested under any other key fail verification, so a deployment that
//! persists its store must also persist the key (see
//! [`DocumentService::with_keypair`]).

use std::sync::Arc;

use bytes::Bytes;
use docshare_core::{
    can_access, latest_verification, validate_signature_data, validate_upload, AccessState,
    Document, DocumentId, DocumentMeta, Ed25519PublicKey, GrantPermissions, Keypair,
    ListedDocument, NewDocument, Operation, PermissionGrant, SignatureRecord, User, UserId,
    VerificationRecord, VerificationRequest,
};
use docshare_store::{DeleteResult, GrantInsert, SignatureInsert, Store, StoreError};

use crate::config::ServiceConfig;
use crate::dto::{
    DocumentDto, DocumentMetadata, Download, GrantDto, SignatureDto, UserSummary, VerificationDto,
};
use crate::error::{Result, ServiceError};
use crate::session::Session;

/// The document sharing service.
///
/// Cheap to share across handlers behind an `Arc`; all state lives in the
/// store.
pub struct DocumentService<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: ServiceConfig,
    /// Countersigns signature records.
    keypair: Keypair,
}

impl<S: Store> DocumentService<S> {
    /// Create a new service over `store` with a fresh attestation key.
    pub fn new(store: S, config: ServiceConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            keypair: Keypair::generate(),
        }
    }

    /// Use `keypair` as the attestation key.
    pub fn with_keypair(mut self, keypair: Keypair) -> Self {
        self.keypair = keypair;
        self
    }

    /// The key signature records are attested under.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a caller id to a session.
    ///
    /// Absent, blank and unknown ids are all `Unauthenticated`.
    pub async fn authenticate(&self, user_id: Option<&str>) -> Result<Session> {
        let id = match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => UserId::new(id),
            _ => return Err(ServiceError::Unauthenticated),
        };

        match self.store.get_user(&id).await? {
            Some(user) => Ok(Session::new(user)),
            None => {
                tracing::warn!(user_id = %id, "authentication failed for unknown user");
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Document Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate and store an upload owned by the caller.
    pub async fn create_document(
        &self,
        session: &Session,
        upload: NewDocument,
    ) -> Result<DocumentDto> {
        if let Err(err) = validate_upload(&upload, &self.config.upload) {
            tracing::warn!(
                user_id = %session.user_id(),
                file_name = %upload.file_name,
                error = %err,
                "upload rejected"
            );
            return Err(err.into());
        }

        let doc = self
            .store
            .insert_document(session.user_id(), &upload, now_millis())
            .await?;

        tracing::info!(
            document_id = %doc.id,
            user_id = %session.user_id(),
            size = doc.size_bytes,
            "document uploaded"
        );

        Ok(DocumentDto::from_meta(&doc.meta(), session.user_id()))
    }

    /// Look up a document without any access check.
    ///
    /// For internal callers; handlers go through the gated operations.
    pub async fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Documents the caller owns or has been granted, newest first.
    ///
    /// Each document appears once, even if the caller both owns it and
    /// holds a grant on it.
    pub async fn list_documents_visible_to(&self, session: &Session) -> Result<Vec<DocumentDto>> {
        let docs = self.store.list_visible_to(session.user_id()).await?;
        Ok(docs
            .iter()
            .map(|listed| DocumentDto::from_listing(listed, session.user_id()))
            .collect())
    }

    /// Delete a document and every grant on it. Owner only.
    pub async fn delete_document(&self, session: &Session, id: DocumentId) -> Result<()> {
        self.authorize(session, id, Operation::Delete).await?;

        match self.store.delete_document(id).await? {
            DeleteResult::Deleted { grants_removed } => {
                tracing::info!(
                    document_id = %id,
                    user_id = %session.user_id(),
                    grants_removed,
                    "document deleted"
                );
                Ok(())
            }
            DeleteResult::NotFound => Err(not_found(id)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Download / Metadata
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch a document's content for an owner or grantee.
    pub async fn download_document(&self, session: &Session, id: DocumentId) -> Result<Download> {
        self.authorize(session, id, Operation::Download).await?;

        // Deleted between the check and the read.
        let doc = self.get_document(id).await?;
        doc.verify_content().map_err(ServiceError::Integrity)?;

        tracing::debug!(document_id = %id, user_id = %session.user_id(), "document downloaded");

        Ok(Download {
            file_name: doc.file_name,
            content_type: doc.content_type,
            size: doc.size_bytes,
            content: doc.content,
        })
    }

    /// Describe a document, including its owner, signatures and latest
    /// verification, for an owner or grantee.
    pub async fn document_metadata(
        &self,
        session: &Session,
        id: DocumentId,
    ) -> Result<DocumentMetadata> {
        let (meta, grant) = self.authorize(session, id, Operation::View).await?;
        let owner = self.load_user(&meta.owner_id, "owner").await?;

        let signatures = self.store.list_signatures(id).await?;
        let mut signature_dtos = Vec::with_capacity(signatures.len());
        for signature in &signatures {
            let signer = self.load_user(&signature.signer_id, "signer").await?;
            signature_dtos.push(SignatureDto::new(signature, &signer));
        }

        let verifications = self.store.list_verifications(id).await?;
        let verification = match latest_verification(&verifications) {
            Some(latest) => {
                let verifier = self.load_user(&latest.verifier_id, "verifier").await?;
                Some(VerificationDto::new(latest, &verifier))
            }
            None => None,
        };

        let shared_at = match grant {
            Some(grant) if !meta.is_owned_by(session.user_id()) => Some(grant.granted_at),
            _ => None,
        };
        let listed = ListedDocument {
            shared_at,
            is_signed: !signatures.is_empty(),
            is_verified: verification.as_ref().is_some_and(|v| v.authentic),
            meta,
        };

        Ok(DocumentMetadata {
            document: DocumentDto::from_listing(&listed, session.user_id()),
            content_hash: listed.meta.content_hash.to_hex(),
            owner: UserSummary::from(&owner),
            signatures: signature_dtos,
            verification,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signing
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign a document. Owner, or grantee with `can_sign`.
    ///
    /// The signature binds the current content hash. Each user signs a
    /// document at most once.
    pub async fn sign_document(
        &self,
        session: &Session,
        id: DocumentId,
        signature_data: Bytes,
    ) -> Result<SignatureDto> {
        self.authorize(session, id, Operation::Sign).await?;
        validate_signature_data(&signature_data)?;

        // Never attest content that already fails its hash.
        let doc = self.get_document(id).await?;
        doc.verify_content().map_err(ServiceError::Integrity)?;

        let record = SignatureRecord::attest(
            &self.keypair,
            &doc.meta(),
            session.user_id(),
            signature_data,
            now_millis(),
        );

        match self.store.insert_signature(&record).await? {
            SignatureInsert::Inserted(signature) => {
                tracing::info!(
                    document_id = %id,
                    user_id = %session.user_id(),
                    signature_id = %signature.id,
                    "document signed"
                );
                Ok(SignatureDto::new(&signature, session.user()))
            }
            SignatureInsert::AlreadySigned => {
                tracing::warn!(
                    document_id = %id,
                    user_id = %session.user_id(),
                    "document already signed by user"
                );
                Err(ServiceError::Conflict(
                    "already signed by this user".to_string(),
                ))
            }
            SignatureInsert::DocumentMissing => Err(not_found(id)),
        }
    }

    /// Verify a document's content and signatures, recording the outcome.
    /// Owner, or grantee with `can_verify`.
    ///
    /// A failed check is a recorded outcome, not an error.
    pub async fn verify_document(
        &self,
        session: &Session,
        id: DocumentId,
        request: VerificationRequest,
    ) -> Result<VerificationDto> {
        self.authorize(session, id, Operation::Verify).await?;
        request.validate()?;

        let doc = self.get_document(id).await?;
        let signatures = self.store.list_signatures(id).await?;
        let outcome = docshare_core::verify_document(&doc, &signatures, &self.public_key());

        let record =
            VerificationRecord::new(id, session.user_id(), &request, &outcome, now_millis());
        let stored = self
            .store
            .insert_verification(&record)
            .await?
            .ok_or_else(|| not_found(id))?;

        if stored.authentic {
            tracing::info!(
                document_id = %id,
                user_id = %session.user_id(),
                signatures_checked = outcome.signatures_checked,
                "document verified"
            );
        } else {
            tracing::warn!(
                document_id = %id,
                user_id = %session.user_id(),
                content_intact = outcome.content_intact,
                signatures_checked = outcome.signatures_checked,
                signatures_valid = outcome.signatures_valid,
                "document failed verification"
            );
        }

        Ok(VerificationDto::new(&stored, session.user()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sharing
    // ─────────────────────────────────────────────────────────────────────────

    /// Give `target` view and download access. Owner only.
    pub async fn share(
        &self,
        session: &Session,
        id: DocumentId,
        target: &UserId,
    ) -> Result<PermissionGrant> {
        self.share_with(session, id, target, GrantPermissions::READ_ONLY)
            .await
    }

    /// Give `target` view and download access plus `permissions`. Owner only.
    pub async fn share_with(
        &self,
        session: &Session,
        id: DocumentId,
        target: &UserId,
        permissions: GrantPermissions,
    ) -> Result<PermissionGrant> {
        self.authorize(session, id, Operation::Share).await?;

        if self.store.get_user(target).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "target user {} not found",
                target
            )));
        }

        if target == session.user_id() {
            return Err(ServiceError::InvalidInput(
                "cannot share with self".to_string(),
            ));
        }

        let inserted = self
            .store
            .insert_grant(id, target, permissions, now_millis())
            .await?;

        match inserted {
            GrantInsert::Inserted(grant) => {
                tracing::info!(
                    document_id = %id,
                    user_id = %session.user_id(),
                    grantee_id = %target,
                    can_sign = permissions.can_sign,
                    can_verify = permissions.can_verify,
                    "document shared"
                );
                Ok(grant)
            }
            GrantInsert::AlreadyExists => {
                tracing::warn!(
                    document_id = %id,
                    grantee_id = %target,
                    "document already shared with user"
                );
                Err(ServiceError::Conflict(
                    "already shared with this user".to_string(),
                ))
            }
            // Ownership changed hands after the check above.
            GrantInsert::OwnerGrant => Err(ServiceError::InvalidInput(
                "cannot share with the document owner".to_string(),
            )),
            GrantInsert::DocumentMissing => Err(not_found(id)),
        }
    }

    /// Share with the user registered under `email`.
    pub async fn share_by_email(
        &self,
        session: &Session,
        id: DocumentId,
        email: &str,
        permissions: GrantPermissions,
    ) -> Result<PermissionGrant> {
        // Ownership first, so strangers cannot learn which emails exist.
        self.authorize(session, id, Operation::Share).await?;

        let target = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!("no user registered with email {}", email))
            })?;

        self.share_with(session, id, &target.id, permissions).await
    }

    /// Withdraw `grantee`'s access. Owner only.
    ///
    /// Returns whether a grant was removed; revoking twice is not an error.
    pub async fn revoke(
        &self,
        session: &Session,
        id: DocumentId,
        grantee: &UserId,
    ) -> Result<bool> {
        self.authorize(session, id, Operation::Revoke).await?;

        let removed = self.store.delete_grant(id, grantee).await?;
        if removed {
            tracing::info!(
                document_id = %id,
                user_id = %session.user_id(),
                grantee_id = %grantee,
                "grant revoked"
            );
        }
        Ok(removed)
    }

    /// Grants on a document, oldest first. Owner only.
    pub async fn list_grants(&self, session: &Session, id: DocumentId) -> Result<Vec<GrantDto>> {
        self.authorize(session, id, Operation::ListGrants).await?;

        let grants = self.store.list_grants(id).await?;
        let mut dtos = Vec::with_capacity(grants.len());
        for grant in &grants {
            let grantee = self.load_user(&grant.grantee_id, "grantee").await?;
            dtos.push(GrantDto::new(grant, &grantee));
        }
        Ok(dtos)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a document's metadata and the caller's grant, and check
    /// `operation` against them.
    async fn authorize(
        &self,
        session: &Session,
        id: DocumentId,
        operation: Operation,
    ) -> Result<(DocumentMeta, Option<PermissionGrant>)> {
        let user = session.user_id();
        let meta = self
            .store
            .get_document_meta(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        // Only the caller's own grant can change the caller's relation.
        let grant = self.store.get_grant(id, user).await?;
        let state = AccessState::from_grants(id, grant.iter());

        if !can_access(user, &meta, &state, operation) {
            tracing::warn!(
                document_id = %id,
                user_id = %user,
                operation = %operation,
                "access denied"
            );
            return Err(ServiceError::Forbidden(format!(
                "{} not permitted on document {}",
                operation, id
            )));
        }

        Ok((meta, grant))
    }

    /// Load a user a stored record refers to.
    async fn load_user(&self, id: &UserId, role: &str) -> Result<User> {
        let user = self.store.get_user(id).await?.ok_or_else(|| {
            StoreError::DanglingReference(format!("{} {} does not exist", role, id))
        })?;
        Ok(user)
    }
}

fn not_found(id: DocumentId) -> ServiceError {
    ServiceError::NotFound(format!("document {}", id))
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use docshare_core::{User, UploadPolicy};
    use docshare_store::MemoryStore;

    async fn service() -> DocumentService<MemoryStore> {
        let store = MemoryStore::new();
        for (id, email) in [
            ("1", "alice@example.com"),
            ("2", "bob@example.com"),
            ("3", "carol@example.com"),
        ] {
            store.insert_user(&User::new(id, email).unwrap()).await.unwrap();
        }
        DocumentService::new(store, ServiceConfig::default())
    }

    fn pdf(len: usize) -> NewDocument {
        NewDocument::new("contract.pdf", "application/pdf", vec![7u8; len])
    }

    #[tokio::test]
    async fn test_authenticate() {
        let svc = service().await;

        assert_eq!(svc.authenticate(Some("1")).await.unwrap().user_id().as_str(), "1");
        assert!(matches!(
            svc.authenticate(None).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(matches!(
            svc.authenticate(Some("  ")).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(matches!(
            svc.authenticate(Some("99")).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_create_document_validates() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();

        let cases = [
            NewDocument::new("empty.pdf", "application/pdf", Vec::new()),
            pdf(10).declared_size(11),
            NewDocument::new("notes.txt", "text/plain", b"hello".to_vec()),
            NewDocument::new("contract.exe", "application/pdf", b"hello".to_vec()),
            pdf(10).category("c".repeat(51)),
        ];
        for upload in cases {
            let err = svc.create_document(&alice, upload).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert!(svc.list_documents_visible_to(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_size_ceiling_from_config() {
        let store = MemoryStore::new();
        store
            .insert_user(&User::new("1", "alice@example.com").unwrap())
            .await
            .unwrap();
        let config = ServiceConfig::default().with_upload(UploadPolicy::pdf_only().with_max_size(100));
        let svc = DocumentService::new(store, config);
        let alice = svc.authenticate(Some("1")).await.unwrap();

        assert!(svc.create_document(&alice, pdf(100)).await.is_ok());
        let err = svc.create_document(&alice, pdf(101)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_create_document_sets_owner() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();

        let dto = svc.create_document(&alice, pdf(2048)).await.unwrap();
        assert!(dto.is_owner);
        assert_eq!(dto.formatted_size, "2 KB");

        let doc = svc.get_document(dto.id).await.unwrap();
        assert_eq!(doc.owner_id, UserId::new("1"));
        assert_eq!(doc.size_bytes, 2048);
    }

    #[tokio::test]
    async fn test_share_errors_in_order() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();

        let missing = svc.share(&alice, DocumentId(999), &UserId::new("2")).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        let stranger = svc.share(&bob, doc.id, &UserId::new("3")).await;
        assert!(matches!(stranger, Err(ServiceError::Forbidden(_))));

        let unknown = svc.share(&alice, doc.id, &UserId::new("99")).await;
        assert!(matches!(unknown, Err(ServiceError::InvalidInput(_))));

        let own = svc.share(&alice, doc.id, &UserId::new("1")).await;
        assert!(matches!(own, Err(ServiceError::InvalidInput(_))));

        svc.share(&alice, doc.id, &UserId::new("2")).await.unwrap();
        let again = svc.share(&alice, doc.id, &UserId::new("2")).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_grantee_cannot_reshare() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        svc.share(&alice, doc.id, bob.user_id()).await.unwrap();

        let reshare = svc.share(&bob, doc.id, &UserId::new("3")).await;
        assert!(matches!(reshare, Err(ServiceError::Forbidden(_))));
        let grants = svc.list_grants(&bob, doc.id).await;
        assert!(matches!(grants, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_share_by_email_is_case_insensitive() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();

        let grant = svc
            .share_by_email(&alice, doc.id, " Bob@Example.COM ", GrantPermissions::READ_ONLY)
            .await
            .unwrap();
        assert_eq!(grant.grantee_id, UserId::new("2"));

        let unknown = svc
            .share_by_email(&alice, doc.id, "nobody@example.com", GrantPermissions::READ_ONLY)
            .await;
        assert!(matches!(unknown, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        svc.share(&alice, doc.id, bob.user_id()).await.unwrap();

        assert!(svc.download_document(&bob, doc.id).await.is_ok());
        assert!(svc.revoke(&alice, doc.id, bob.user_id()).await.unwrap());
        assert!(!svc.revoke(&alice, doc.id, bob.user_id()).await.unwrap());

        let denied = svc.download_document(&bob, doc.id).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        let not_owner = svc.revoke(&bob, doc.id, bob.user_id()).await;
        assert!(matches!(not_owner, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_metadata_includes_owner() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let carol = svc.authenticate(Some("3")).await.unwrap();
        let doc = svc
            .create_document(&alice, pdf(16).description("Q3 contract"))
            .await
            .unwrap();
        svc.share(&alice, doc.id, bob.user_id()).await.unwrap();

        let metadata = svc.document_metadata(&bob, doc.id).await.unwrap();
        assert_eq!(metadata.owner.email, "alice@example.com");
        assert!(!metadata.document.is_owner);
        assert_eq!(metadata.document.description, "Q3 contract");

        let denied = svc.document_metadata(&carol, doc.id).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_sign_requires_flag() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let carol = svc.authenticate(Some("3")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        svc.share(&alice, doc.id, bob.user_id()).await.unwrap();
        svc.share_with(&alice, doc.id, carol.user_id(), GrantPermissions::default().with_sign())
            .await
            .unwrap();

        let denied = svc.sign_document(&bob, doc.id, Bytes::from_static(b"b")).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        let signed = svc
            .sign_document(&carol, doc.id, Bytes::from_static(b"c"))
            .await
            .unwrap();
        assert_eq!(signed.signer.email, "carol@example.com");
        assert_eq!(signed.attested_by, svc.public_key().to_hex());

        let twice = svc.sign_document(&carol, doc.id, Bytes::from_static(b"c")).await;
        assert!(matches!(twice, Err(ServiceError::Conflict(_))));

        let empty = svc.sign_document(&alice, doc.id, Bytes::new()).await;
        assert!(matches!(empty, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_verify_records_outcome() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        svc.share(&alice, doc.id, bob.user_id()).await.unwrap();
        svc.sign_document(&alice, doc.id, Bytes::from_static(b"a"))
            .await
            .unwrap();

        let denied = svc
            .verify_document(&bob, doc.id, VerificationRequest::default())
            .await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        let result = svc
            .verify_document(&alice, doc.id, VerificationRequest::new("", "visual check"))
            .await
            .unwrap();
        assert!(result.authentic);
        assert_eq!(result.signatures_checked, 1);
        assert_eq!(result.method, "automated");
        assert!(result.id.starts_with("VER-"));

        let metadata = svc.document_metadata(&bob, doc.id).await.unwrap();
        assert!(metadata.document.is_signed);
        assert!(metadata.document.is_verified);
        assert_eq!(metadata.signatures.len(), 1);
        assert_eq!(metadata.verification.unwrap().id, result.id);
    }

    #[tokio::test]
    async fn test_rotated_key_fails_verification() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        svc.sign_document(&alice, doc.id, Bytes::from_static(b"a"))
            .await
            .unwrap();

        let svc = svc.with_keypair(Keypair::from_seed(&[5u8; 32]));
        let result = svc
            .verify_document(&alice, doc.id, VerificationRequest::default())
            .await
            .unwrap();
        assert!(!result.authentic);

        let listed = svc.list_documents_visible_to(&alice).await.unwrap();
        assert!(listed[0].is_signed);
        assert!(!listed[0].is_verified);
    }

    #[tokio::test]
    async fn test_listing_shows_shared_at() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let bob = svc.authenticate(Some("2")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        let grant = svc.share(&alice, doc.id, bob.user_id()).await.unwrap();

        let mine = svc.list_documents_visible_to(&alice).await.unwrap();
        assert_eq!(mine[0].shared_at, None);
        let theirs = svc.list_documents_visible_to(&bob).await.unwrap();
        assert_eq!(theirs[0].shared_at, Some(grant.granted_at));
    }

    #[tokio::test]
    async fn test_list_grants_with_email() {
        let svc = service().await;
        let alice = svc.authenticate(Some("1")).await.unwrap();
        let doc = svc.create_document(&alice, pdf(16)).await.unwrap();
        svc.share(&alice, doc.id, &UserId::new("3")).await.unwrap();
        svc.share(&alice, doc.id, &UserId::new("2")).await.unwrap();

        let grants = svc.list_grants(&alice, doc.id).await.unwrap();
        let emails: Vec<_> = grants.iter().map(|g| g.grantee.email.as_str()).collect();
        assert_eq!(emails, vec!["carol@example.com", "bob@example.com"]);
    }
}
