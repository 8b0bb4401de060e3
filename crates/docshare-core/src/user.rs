//! User records as seen by the access-control core.
//!
//! Users are created by the identity provider. The core only reads them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::UserId;

/// An identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable opaque id.
    pub id: UserId,
    /// Email address, stored normalized (trimmed, lowercase).
    pub email: String,
    /// Display name. The identity provider defaults this to the email.
    pub user_name: String,
}

impl User {
    /// Build a user record, normalizing the email.
    ///
    /// The user name defaults to the normalized email, matching how accounts
    /// are registered.
    pub fn new(id: impl Into<UserId>, email: &str) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_blank() {
            return Err(CoreError::InvalidUserId(id.to_string()));
        }
        let email = normalize_email(email)?;
        Ok(Self {
            id,
            user_name: email.clone(),
            email,
        })
    }

    /// Override the display name.
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }
}

/// Normalize an email address for storage and case-insensitive lookup.
///
/// Only a minimal shape check is done: one `@` with text on both sides.
pub fn normalize_email(email: &str) -> Result<String, CoreError> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(trimmed.to_lowercase())
        }
        _ => Err(CoreError::InvalidEmail(email.to_string())),
    }
}
