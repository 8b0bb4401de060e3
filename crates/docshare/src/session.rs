//! Authenticated sessions.
//!
//! A [`Session`] is proof that the caller was resolved to a known user. It
//! can only be obtained from [`DocumentService::authenticate`], and every
//! operation takes one explicitly.
//!
//! [`DocumentService::authenticate`]: crate::DocumentService::authenticate

use docshare_core::{User, UserId};

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
}

impl Session {
    pub(crate) fn new(user: User) -> Self {
        Self { user }
    }

    /// The caller's id.
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// The caller's identity record.
    pub fn user(&self) -> &User {
        &self.user
    }
}
