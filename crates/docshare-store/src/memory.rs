//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use docshare_core::{
    latest_verification, normalize_email, Document, DocumentId, DocumentMeta, GrantId,
    GrantPermissions, ListedDocument, NewDocument, PermissionGrant, SignatureId, SignatureRecord,
    User, UserId, VerificationId, VerificationRecord,
};

use crate::error::{Result, StoreError};
use crate::traits::{DeleteResult, GrantInsert, InsertResult, SignatureInsert, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// write holds the lock for its whole check-then-insert sequence.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Users indexed by id.
    users: HashMap<UserId, User>,

    /// Email index: normalized email -> user id.
    emails: HashMap<String, UserId>,

    /// Documents indexed by id.
    documents: BTreeMap<DocumentId, Document>,

    /// Grants indexed by (document, grantee). The key is the uniqueness rule.
    grants: BTreeMap<(DocumentId, UserId), PermissionGrant>,

    /// Signatures indexed by (document, signer).
    signatures: BTreeMap<(DocumentId, UserId), SignatureRecord>,

    /// Verifications indexed by id.
    verifications: BTreeMap<VerificationId, VerificationRecord>,

    /// Last assigned ids.
    last_document_id: i64,
    last_grant_id: i64,
    last_signature_id: i64,
    last_verification_id: i64,
}

impl MemoryStoreInner {
    fn verifications_of(&self, document_id: DocumentId) -> Vec<VerificationRecord> {
        let mut records: Vec<VerificationRecord> = self
            .verifications
            .values()
            .filter(|v| v.document_id == document_id)
            .cloned()
            .collect();
        records.sort_by_key(|v| (v.verified_at, v.id));
        records
    }

    fn listing(&self, doc: &Document, viewer: &UserId) -> ListedDocument {
        let shared_at = if doc.owner_id == *viewer {
            None
        } else {
            self.grants
                .get(&(doc.id, viewer.clone()))
                .map(|g| g.granted_at)
        };
        let is_signed = self.signatures.keys().any(|(doc_id, _)| *doc_id == doc.id);
        let is_verified = latest_verification(&self.verifications_of(doc.id))
            .is_some_and(|v| v.authentic);

        ListedDocument {
            meta: doc.meta(),
            shared_at,
            is_signed,
            is_verified,
        }
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<InsertResult> {
        let email = normalize_email(&user.email)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let mut inner = self.write()?;

        if inner.users.contains_key(&user.id) {
            return Ok(InsertResult::AlreadyExists);
        }

        if let Some(other) = inner.emails.get(&email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered to user {}",
                email, other
            )));
        }

        let mut stored = user.clone();
        stored.email = email.clone();
        inner.emails.insert(email, user.id.clone());
        inner.users.insert(user.id.clone(), stored);

        Ok(InsertResult::Inserted)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        let inner = self.read()?;

        Ok(inner
            .emails
            .get(&email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn insert_document(
        &self,
        owner: &UserId,
        upload: &NewDocument,
        uploaded_at: i64,
    ) -> Result<Document> {
        let mut inner = self.write()?;

        if !inner.users.contains_key(owner) {
            return Err(StoreError::DanglingReference(format!(
                "owner {} does not exist",
                owner
            )));
        }

        inner.last_document_id += 1;
        let id = DocumentId(inner.last_document_id);
        let doc = Document::from_upload(id, owner.clone(), upload, uploaded_at);
        inner.documents.insert(id, doc.clone());

        Ok(doc)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        Ok(self.read()?.documents.get(&id).cloned())
    }

    async fn get_document_meta(&self, id: DocumentId) -> Result<Option<DocumentMeta>> {
        Ok(self.read()?.documents.get(&id).map(Document::meta))
    }

    async fn list_visible_to(&self, user: &UserId) -> Result<Vec<ListedDocument>> {
        let inner = self.read()?;

        // Iterating documents (not grants) yields each document at most once.
        let mut docs: Vec<ListedDocument> = inner
            .documents
            .values()
            .filter(|d| {
                &d.owner_id == user || inner.grants.contains_key(&(d.id, user.clone()))
            })
            .map(|d| inner.listing(d, user))
            .collect();

        docs.sort_by(|a, b| {
            b.meta
                .uploaded_at
                .cmp(&a.meta.uploaded_at)
                .then_with(|| b.meta.id.cmp(&a.meta.id))
        });
        Ok(docs)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<DeleteResult> {
        let mut inner = self.write()?;

        if inner.documents.remove(&id).is_none() {
            return Ok(DeleteResult::NotFound);
        }

        let before = inner.grants.len();
        inner.grants.retain(|(doc_id, _), _| *doc_id != id);
        let grants_removed = before - inner.grants.len();
        inner.signatures.retain(|(doc_id, _), _| *doc_id != id);
        inner.verifications.retain(|_, v| v.document_id != id);

        Ok(DeleteResult::Deleted { grants_removed })
    }

    async fn insert_grant(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
        permissions: GrantPermissions,
        granted_at: i64,
    ) -> Result<GrantInsert> {
        let mut inner = self.write()?;

        match inner.documents.get(&document_id) {
            None => return Ok(GrantInsert::DocumentMissing),
            Some(doc) if &doc.owner_id == grantee => return Ok(GrantInsert::OwnerGrant),
            Some(_) => {}
        }

        if !inner.users.contains_key(grantee) {
            return Err(StoreError::DanglingReference(format!(
                "grantee {} does not exist",
                grantee
            )));
        }

        let key = (document_id, grantee.clone());
        if inner.grants.contains_key(&key) {
            return Ok(GrantInsert::AlreadyExists);
        }

        inner.last_grant_id += 1;
        let grant = PermissionGrant {
            id: GrantId(inner.last_grant_id),
            document_id,
            grantee_id: grantee.clone(),
            permissions,
            granted_at,
        };
        inner.grants.insert(key, grant.clone());

        Ok(GrantInsert::Inserted(grant))
    }

    async fn delete_grant(&self, document_id: DocumentId, grantee: &UserId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner
            .grants
            .remove(&(document_id, grantee.clone()))
            .is_some())
    }

    async fn get_grant(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
    ) -> Result<Option<PermissionGrant>> {
        let inner = self.read()?;
        Ok(inner.grants.get(&(document_id, grantee.clone())).cloned())
    }

    async fn list_grants(&self, document_id: DocumentId) -> Result<Vec<PermissionGrant>> {
        let inner = self.read()?;

        let mut grants: Vec<PermissionGrant> = inner
            .grants
            .values()
            .filter(|g| g.document_id == document_id)
            .cloned()
            .collect();

        grants.sort_by_key(|g| (g.granted_at, g.id));
        Ok(grants)
    }

    async fn insert_signature(&self, signature: &SignatureRecord) -> Result<SignatureInsert> {
        let mut inner = self.write()?;

        if !inner.documents.contains_key(&signature.document_id) {
            return Ok(SignatureInsert::DocumentMissing);
        }

        if !inner.users.contains_key(&signature.signer_id) {
            return Err(StoreError::DanglingReference(format!(
                "signer {} does not exist",
                signature.signer_id
            )));
        }

        let key = (signature.document_id, signature.signer_id.clone());
        if inner.signatures.contains_key(&key) {
            return Ok(SignatureInsert::AlreadySigned);
        }

        inner.last_signature_id += 1;
        let mut stored = signature.clone();
        stored.id = SignatureId(inner.last_signature_id);
        inner.signatures.insert(key, stored.clone());

        Ok(SignatureInsert::Inserted(stored))
    }

    async fn list_signatures(&self, document_id: DocumentId) -> Result<Vec<SignatureRecord>> {
        let inner = self.read()?;

        let mut signatures: Vec<SignatureRecord> = inner
            .signatures
            .values()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect();

        signatures.sort_by_key(|s| (s.signed_at, s.id));
        Ok(signatures)
    }

    async fn insert_verification(
        &self,
        verification: &VerificationRecord,
    ) -> Result<Option<VerificationRecord>> {
        let mut inner = self.write()?;

        if !inner.documents.contains_key(&verification.document_id) {
            return Ok(None);
        }

        if !inner.users.contains_key(&verification.verifier_id) {
            return Err(StoreError::DanglingReference(format!(
                "verifier {} does not exist",
                verification.verifier_id
            )));
        }

        inner.last_verification_id += 1;
        let mut stored = verification.clone();
        stored.id = VerificationId(inner.last_verification_id);
        inner.verifications.insert(stored.id, stored.clone());

        Ok(Some(stored))
    }

    async fn list_verifications(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<VerificationRecord>> {
        Ok(self.read()?.verifications_of(document_id))
    }
}
