//! # Docshare Store
//!
//! Storage abstraction for docshare. Provides a trait-based interface for
//! users, documents, permission grants, signatures and verifications with
//! SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait,
//! allowing the service to be storage-agnostic. The primary implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`GrantInsert`] - Result of recording a grant
//! - [`SignatureInsert`] - Result of recording a signature
//! - [`DeleteResult`] - Result of deleting a document
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docshare_store::{SqliteStore, Store};
//! use docshare_core::{NewDocument, User};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("docshare.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let alice = User::new("1", "alice@example.com").unwrap();
//!     store.insert_user(&alice).await.unwrap();
//!
//!     let upload = NewDocument::new("contract.pdf", "application/pdf", b"%PDF-1.7".to_vec());
//!     let doc = store.insert_document(&alice.id, &upload, 0).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Unique grants**: one grant per (document, grantee), never to the owner
//! - **Unique signatures**: one signature per (document, signer)
//! - **Cascade delete**: deleting a document deletes its grants, signatures
//!   and verifications in the same transaction
//! - **No policy**: the store never decides who may do what; callers evaluate first

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DeleteResult, GrantInsert, InsertResult, SignatureInsert, Store, StoreExt};
