//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for docshare. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use docshare_core::{
    normalize_email, ContentHash, Document, DocumentId, DocumentMeta, Ed25519PublicKey,
    Ed25519Signature, GrantId, GrantPermissions, ListedDocument, NewDocument, PermissionGrant,
    SignatureId, SignatureRecord, User, UserId, VerificationId, VerificationRecord,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DeleteResult, GrantInsert, InsertResult, SignatureInsert, Store};

const META_COLUMNS: &str = "id, owner_id, file_name, content_type, size_bytes, content_hash,
     description, category, uploaded_at";

const GRANT_COLUMNS: &str = "id, document_id, grantee_id, can_sign, can_verify, granted_at";

const SIGNATURE_COLUMNS: &str = "id, document_id, signer_id, signature_data, content_hash,
     signed_at, attested_by, attestation";

const VERIFICATION_COLUMNS: &str = "id, document_id, verifier_id, method, notes, authentic,
     signatures_checked, verified_at";

const DOCUMENT_COLUMNS: &str = "id, owner_id, file_name, content_type, size_bytes, content_hash,
     description, category, uploaded_at, content";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Holding the mutex for the whole of
/// each operation serializes conflicting writes.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        // Cascades only fire with foreign keys enabled, per connection.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn blob_column_error(idx: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, name.into(), Type::Blob)
}

// Helper to convert a row to DocumentMeta
fn row_to_meta(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentMeta> {
    let hash_bytes: Vec<u8> = row.get("content_hash")?;
    let content_hash = ContentHash::try_from(hash_bytes.as_slice())
        .map_err(|_| blob_column_error(5, "content_hash"))?;

    Ok(DocumentMeta {
        id: DocumentId(row.get("id")?),
        owner_id: UserId::new(row.get::<_, String>("owner_id")?),
        file_name: row.get("file_name")?,
        content_type: row.get("content_type")?,
        size_bytes: row.get::<_, i64>("size_bytes")? as u64,
        content_hash,
        description: row.get("description")?,
        category: row.get("category")?,
        uploaded_at: row.get("uploaded_at")?,
    })
}

// Helper to convert a row to Document
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let meta = row_to_meta(row)?;
    let content: Vec<u8> = row.get("content")?;

    Ok(Document {
        id: meta.id,
        owner_id: meta.owner_id,
        file_name: meta.file_name,
        content_type: meta.content_type,
        size_bytes: meta.size_bytes,
        content: Bytes::from(content),
        content_hash: meta.content_hash,
        description: meta.description,
        category: meta.category,
        uploaded_at: meta.uploaded_at,
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get::<_, String>("id")?),
        email: row.get("email")?,
        user_name: row.get("user_name")?,
    })
}

fn row_to_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<PermissionGrant> {
    Ok(PermissionGrant {
        id: GrantId(row.get("id")?),
        document_id: DocumentId(row.get("document_id")?),
        grantee_id: UserId::new(row.get::<_, String>("grantee_id")?),
        permissions: GrantPermissions {
            can_sign: row.get("can_sign")?,
            can_verify: row.get("can_verify")?,
        },
        granted_at: row.get("granted_at")?,
    })
}

fn row_to_listed(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListedDocument> {
    Ok(ListedDocument {
        meta: row_to_meta(row)?,
        shared_at: row.get("shared_at")?,
        is_signed: row.get("is_signed")?,
        is_verified: row.get("is_verified")?,
    })
}

fn row_to_signature(row: &rusqlite::Row<'_>) -> rusqlite::Result<SignatureRecord> {
    let hash: Vec<u8> = row.get("content_hash")?;
    let key: Vec<u8> = row.get("attested_by")?;
    let attestation: Vec<u8> = row.get("attestation")?;
    let data: Vec<u8> = row.get("signature_data")?;

    Ok(SignatureRecord {
        id: SignatureId(row.get("id")?),
        document_id: DocumentId(row.get("document_id")?),
        signer_id: UserId::new(row.get::<_, String>("signer_id")?),
        signature_data: Bytes::from(data),
        content_hash: ContentHash::try_from(hash.as_slice())
            .map_err(|_| blob_column_error(4, "content_hash"))?,
        signed_at: row.get("signed_at")?,
        attested_by: Ed25519PublicKey::try_from(key.as_slice())
            .map_err(|_| blob_column_error(6, "attested_by"))?,
        attestation: Ed25519Signature::try_from(attestation.as_slice())
            .map_err(|_| blob_column_error(7, "attestation"))?,
    })
}

fn row_to_verification(row: &rusqlite::Row<'_>) -> rusqlite::Result<VerificationRecord> {
    Ok(VerificationRecord {
        id: VerificationId(row.get("id")?),
        document_id: DocumentId(row.get("document_id")?),
        verifier_id: UserId::new(row.get::<_, String>("verifier_id")?),
        method: row.get("method")?,
        notes: row.get("notes")?,
        authentic: row.get("authentic")?,
        signatures_checked: row.get("signatures_checked")?,
        verified_at: row.get("verified_at")?,
    })
}

fn user_exists(conn: &Connection, id: &UserId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id.as_str()],
        |row| row.get(0),
    )
}

fn document_exists(conn: &Connection, id: DocumentId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM documents WHERE id = ?1)",
        params![id.0],
        |row| row.get(0),
    )
}

fn document_owner(conn: &Connection, id: DocumentId) -> rusqlite::Result<Option<UserId>> {
    conn.query_row(
        "SELECT owner_id FROM documents WHERE id = ?1",
        params![id.0],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map(|owner| owner.map(UserId::new))
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<InsertResult> {
        let email = normalize_email(&user.email)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let user = user.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if user_exists(&tx, &user.id)? {
                return Ok(InsertResult::AlreadyExists);
            }

            let email_owner: Option<String> = tx
                .query_row(
                    "SELECT id FROM users WHERE email = ?1",
                    params![email],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(other) = email_owner {
                return Err(StoreError::Conflict(format!(
                    "email {} already registered to user {}",
                    email, other
                )));
            }

            tx.execute(
                "INSERT INTO users (id, email, user_name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id.as_str(), email, user.user_name, now_millis()],
            )?;
            tx.commit()?;

            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let id = id.clone();

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, email, user_name FROM users WHERE id = ?1",
                params![id.as_str()],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, email, user_name FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn insert_document(
        &self,
        owner: &UserId,
        upload: &NewDocument,
        uploaded_at: i64,
    ) -> Result<Document> {
        let mut doc = Document::from_upload(DocumentId(0), owner.clone(), upload, uploaded_at);

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if !user_exists(&tx, &doc.owner_id)? {
                return Err(StoreError::DanglingReference(format!(
                    "owner {} does not exist",
                    doc.owner_id
                )));
            }

            tx.execute(
                "INSERT INTO documents (
                    owner_id, file_name, content_type, size_bytes, content,
                    content_hash, description, category, uploaded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    doc.owner_id.as_str(),
                    doc.file_name,
                    doc.content_type,
                    doc.size_bytes as i64,
                    &doc.content[..],
                    doc.content_hash.as_bytes().as_slice(),
                    doc.description,
                    doc.category,
                    doc.uploaded_at,
                ],
            )?;
            doc.id = DocumentId(tx.last_insert_rowid());
            tx.commit()?;

            tracing::debug!(document_id = %doc.id, owner = %doc.owner_id, "stored document");
            Ok(doc)
        })
        .await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                params![id.0],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_document_meta(&self, id: DocumentId) -> Result<Option<DocumentMeta>> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {META_COLUMNS} FROM documents WHERE id = ?1"),
                params![id.0],
                row_to_meta,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_visible_to(&self, user: &UserId) -> Result<Vec<ListedDocument>> {
        let user = user.clone();

        self.blocking(move |conn| {
            // The join matches at most one grant per document (unique pair),
            // and never for documents the viewer owns.
            let mut stmt = conn.prepare(
                "SELECT d.id AS id, d.owner_id AS owner_id, d.file_name AS file_name,
                        d.content_type AS content_type, d.size_bytes AS size_bytes,
                        d.content_hash AS content_hash, d.description AS description,
                        d.category AS category, d.uploaded_at AS uploaded_at,
                        g.granted_at AS shared_at,
                        EXISTS (
                            SELECT 1 FROM signatures s WHERE s.document_id = d.id
                        ) AS is_signed,
                        COALESCE((
                            SELECT v.authentic FROM verifications v
                            WHERE v.document_id = d.id
                            ORDER BY v.verified_at DESC, v.id DESC
                            LIMIT 1
                        ), 0) AS is_verified
                 FROM documents d
                 LEFT JOIN permission_grants g
                    ON g.document_id = d.id AND g.grantee_id = ?1 AND d.owner_id <> ?1
                 WHERE d.owner_id = ?1 OR g.id IS NOT NULL
                 ORDER BY d.uploaded_at DESC, d.id DESC",
            )?;

            let docs = stmt
                .query_map(params![user.as_str()], row_to_listed)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(docs)
        })
        .await
    }

    async fn delete_document(&self, id: DocumentId) -> Result<DeleteResult> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if !document_exists(&tx, id)? {
                return Ok(DeleteResult::NotFound);
            }

            // The foreign key cascades too; deleting explicitly gives the count.
            // Signatures and verifications go with the cascade.
            let grants_removed = tx.execute(
                "DELETE FROM permission_grants WHERE document_id = ?1",
                params![id.0],
            )?;
            tx.execute("DELETE FROM documents WHERE id = ?1", params![id.0])?;
            tx.commit()?;

            tracing::debug!(document_id = %id, grants_removed, "deleted document");
            Ok(DeleteResult::Deleted { grants_removed })
        })
        .await
    }

    async fn insert_grant(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
        permissions: GrantPermissions,
        granted_at: i64,
    ) -> Result<GrantInsert> {
        let grantee = grantee.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            match document_owner(&tx, document_id)? {
                None => return Ok(GrantInsert::DocumentMissing),
                Some(owner) if owner == grantee => return Ok(GrantInsert::OwnerGrant),
                Some(_) => {}
            }

            if !user_exists(&tx, &grantee)? {
                return Err(StoreError::DanglingReference(format!(
                    "grantee {} does not exist",
                    grantee
                )));
            }

            let inserted = tx.execute(
                "INSERT INTO permission_grants
                    (document_id, grantee_id, can_sign, can_verify, granted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(document_id, grantee_id) DO NOTHING",
                params![
                    document_id.0,
                    grantee.as_str(),
                    permissions.can_sign,
                    permissions.can_verify,
                    granted_at
                ],
            )?;

            if inserted == 0 {
                return Ok(GrantInsert::AlreadyExists);
            }

            let id = GrantId(tx.last_insert_rowid());
            tx.commit()?;

            Ok(GrantInsert::Inserted(PermissionGrant {
                id,
                document_id,
                grantee_id: grantee,
                permissions,
                granted_at,
            }))
        })
        .await
    }

    async fn delete_grant(&self, document_id: DocumentId, grantee: &UserId) -> Result<bool> {
        let grantee = grantee.clone();

        self.blocking(move |conn| {
            let removed = conn.execute(
                "DELETE FROM permission_grants WHERE document_id = ?1 AND grantee_id = ?2",
                params![document_id.0, grantee.as_str()],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn get_grant(
        &self,
        document_id: DocumentId,
        grantee: &UserId,
    ) -> Result<Option<PermissionGrant>> {
        let grantee = grantee.clone();

        self.blocking(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {GRANT_COLUMNS} FROM permission_grants
                     WHERE document_id = ?1 AND grantee_id = ?2"
                ),
                params![document_id.0, grantee.as_str()],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_grants(&self, document_id: DocumentId) -> Result<Vec<PermissionGrant>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GRANT_COLUMNS} FROM permission_grants
                 WHERE document_id = ?1
                 ORDER BY granted_at, id"
            ))?;

            let grants = stmt
                .query_map(params![document_id.0], row_to_grant)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(grants)
        })
        .await
    }

    async fn insert_signature(&self, signature: &SignatureRecord) -> Result<SignatureInsert> {
        let mut signature = signature.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if !document_exists(&tx, signature.document_id)? {
                return Ok(SignatureInsert::DocumentMissing);
            }

            if !user_exists(&tx, &signature.signer_id)? {
                return Err(StoreError::DanglingReference(format!(
                    "signer {} does not exist",
                    signature.signer_id
                )));
            }

            let inserted = tx.execute(
                "INSERT INTO signatures (
                    document_id, signer_id, signature_data, content_hash,
                    signed_at, attested_by, attestation
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(document_id, signer_id) DO NOTHING",
                params![
                    signature.document_id.0,
                    signature.signer_id.as_str(),
                    &signature.signature_data[..],
                    signature.content_hash.as_bytes().as_slice(),
                    signature.signed_at,
                    signature.attested_by.as_bytes().as_slice(),
                    signature.attestation.as_bytes().as_slice(),
                ],
            )?;

            if inserted == 0 {
                return Ok(SignatureInsert::AlreadySigned);
            }

            signature.id = SignatureId(tx.last_insert_rowid());
            tx.commit()?;

            tracing::debug!(
                document_id = %signature.document_id,
                signer = %signature.signer_id,
                "stored signature"
            );
            Ok(SignatureInsert::Inserted(signature))
        })
        .await
    }

    async fn list_signatures(&self, document_id: DocumentId) -> Result<Vec<SignatureRecord>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SIGNATURE_COLUMNS} FROM signatures
                 WHERE document_id = ?1
                 ORDER BY signed_at, id"
            ))?;

            let signatures = stmt
                .query_map(params![document_id.0], row_to_signature)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(signatures)
        })
        .await
    }

    async fn insert_verification(
        &self,
        verification: &VerificationRecord,
    ) -> Result<Option<VerificationRecord>> {
        let mut verification = verification.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if !document_exists(&tx, verification.document_id)? {
                return Ok(None);
            }

            if !user_exists(&tx, &verification.verifier_id)? {
                return Err(StoreError::DanglingReference(format!(
                    "verifier {} does not exist",
                    verification.verifier_id
                )));
            }

            tx.execute(
                "INSERT INTO verifications (
                    document_id, verifier_id, method, notes, authentic,
                    signatures_checked, verified_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    verification.document_id.0,
                    verification.verifier_id.as_str(),
                    verification.method,
                    verification.notes,
                    verification.authentic,
                    verification.signatures_checked,
                    verification.verified_at,
                ],
            )?;
            verification.id = VerificationId(tx.last_insert_rowid());
            tx.commit()?;

            Ok(Some(verification))
        })
        .await
    }

    async fn list_verifications(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<VerificationRecord>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {VERIFICATION_COLUMNS} FROM verifications
                 WHERE document_id = ?1
                 ORDER BY verified_at, id"
            ))?;

            let verifications = stmt
                .query_map(params![document_id.0], row_to_verification)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(verifications)
        })
        .await
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
