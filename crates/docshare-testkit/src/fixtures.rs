//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;

use docshare::{DocumentService, ServiceConfig, Session};
use docshare_core::{NewDocument, User};
use docshare_store::{MemoryStore, SqliteStore, Store, StoreError};
use rand::RngCore;

/// Header every sample PDF starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-1.7\n";

/// The three users every fixture knows: alice (1), bob (2) and carol (3).
pub fn seeded_users() -> [User; 3] {
    [
        User::new("1", "alice@example.com")
            .expect("valid user")
            .with_user_name("alice"),
        User::new("2", "bob@example.com")
            .expect("valid user")
            .with_user_name("bob"),
        User::new("3", "carol@example.com")
            .expect("valid user")
            .with_user_name("carol"),
    ]
}

/// Insert the seeded users into `store`.
pub async fn seed_users<S: Store + ?Sized>(store: &S) -> Result<(), StoreError> {
    for user in seeded_users() {
        store.insert_user(&user).await?;
    }
    Ok(())
}

/// A `contract.pdf` upload of exactly `len` bytes with random content.
pub fn sample_pdf(len: usize) -> NewDocument {
    NewDocument::new("contract.pdf", "application/pdf", random_pdf_bytes(len))
}

/// `len` bytes starting with the PDF header (truncated if `len` is shorter).
pub fn random_pdf_bytes(len: usize) -> Vec<u8> {
    let mut content = vec![0u8; len];
    let header = PDF_MAGIC.len().min(len);
    content[..header].copy_from_slice(&PDF_MAGIC[..header]);
    rand::thread_rng().fill_bytes(&mut content[header..]);
    content
}

/// A service over a seeded store, with a session for each seeded user.
pub struct TestFixture<S: Store> {
    pub service: DocumentService<S>,
    pub alice: Session,
    pub bob: Session,
    pub carol: Session,
}

impl TestFixture<MemoryStore> {
    /// Fixture over a fresh in-memory store.
    pub async fn memory() -> Self {
        Self::with_store(MemoryStore::new(), ServiceConfig::default()).await
    }
}

impl TestFixture<SqliteStore> {
    /// Fixture over a SQLite database at `path`.
    pub async fn sqlite(path: impl AsRef<Path>) -> Self {
        let store = SqliteStore::open(path).expect("open sqlite store");
        Self::with_store(store, ServiceConfig::default()).await
    }
}

impl<S: Store> TestFixture<S> {
    /// Seed `store` and build a service over it.
    pub async fn with_store(store: S, config: ServiceConfig) -> Self {
        seed_users(&store).await.expect("seed users");
        let service = DocumentService::new(store, config);

        let alice = authenticate(&service, "1").await;
        let bob = authenticate(&service, "2").await;
        let carol = authenticate(&service, "3").await;

        Self {
            service,
            alice,
            bob,
            carol,
        }
    }

    /// Sessions in seeding order: alice, bob, carol.
    pub fn sessions(&self) -> [&Session; 3] {
        [&self.alice, &self.bob, &self.carol]
    }
}

async fn authenticate<S: Store>(service: &DocumentService<S>, id: &str) -> Session {
    service
        .authenticate(Some(id))
        .await
        .expect("seeded user authenticates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pdf_length_and_header() {
        let upload = sample_pdf(2048);
        assert_eq!(upload.content.len(), 2048);
        assert_eq!(upload.declared_size, 2048);
        assert!(upload.content.starts_with(PDF_MAGIC));

        assert_eq!(random_pdf_bytes(4), b"%PDF".to_vec());
        assert!(random_pdf_bytes(0).is_empty());
    }

    #[tokio::test]
    async fn test_memory_fixture_sessions() {
        let fx = TestFixture::memory().await;
        let ids: Vec<_> = fx.sessions().iter().map(|s| s.user_id().to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(fx.bob.user().user_name, "bob");
    }

    #[tokio::test]
    async fn test_sqlite_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let fx = TestFixture::sqlite(dir.path().join("fixture.db")).await;

        let doc = fx.service.create_document(&fx.alice, sample_pdf(64)).await.unwrap();
        assert!(doc.is_owner);
    }
}
