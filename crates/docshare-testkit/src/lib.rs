//! # Docshare Testkit
//!
//! Testing utilities for docshare.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A service over a seeded store with three known users
//! - **Generators**: Proptest strategies for uploads, operations, grant rights
//!   and action sequences
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use docshare_testkit::fixtures::{sample_pdf, TestFixture};
//!
//! async fn example() {
//!     let fx = TestFixture::memory().await;
//!     let doc = fx.service.create_document(&fx.alice, sample_pdf(2048)).await.unwrap();
//!     fx.service.share(&fx.alice, doc.id, fx.bob.user_id()).await.unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docshare_testkit::generators::actions;
//!
//! proptest! {
//!     #[test]
//!     fn grants_follow_actions(script in actions(20)) {
//!         // replay `script` against a service and a model
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{sample_pdf, seed_users, seeded_users, TestFixture};
pub use generators::{actions, Action};
