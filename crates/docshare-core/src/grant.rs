//! Permission grants.
//!
//! A grant gives one user view/download access to one document, and
//! optionally the right to sign or verify it. Grants are created by the
//! owner through sharing, deleted by revocation or when the document is
//! deleted, and never modified.

use serde::{Deserialize, Serialize};

use crate::types::{DocumentId, GrantId, UserId};

/// Rights a grant carries beyond viewing and downloading.
///
/// There is no re-share flag: only owners share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrantPermissions {
    pub can_sign: bool,
    pub can_verify: bool,
}

impl GrantPermissions {
    /// View and download only.
    pub const READ_ONLY: Self = Self {
        can_sign: false,
        can_verify: false,
    };

    pub fn with_sign(mut self) -> Self {
        self.can_sign = true;
        self
    }

    pub fn with_verify(mut self) -> Self {
        self.can_verify = true;
        self
    }
}

/// Delegated access to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub id: GrantId,

    /// The document being shared. Non-owning reference.
    pub document_id: DocumentId,

    /// The user receiving access. The store refuses grants to the owner.
    pub grantee_id: UserId,

    /// Rights beyond view and download.
    pub permissions: GrantPermissions,

    /// When the grant was created (Unix ms).
    pub granted_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_default_read_only() {
        assert_eq!(GrantPermissions::default(), GrantPermissions::READ_ONLY);
        let both = GrantPermissions::default().with_sign().with_verify();
        assert!(both.can_sign && both.can_verify);
    }

    #[test]
    fn test_permissions_json_shape() {
        let json = serde_json::to_string(&GrantPermissions::default().with_sign()).unwrap();
        assert_eq!(json, r#"{"canSign":true,"canVerify":false}"#);

        let parsed: GrantPermissions = serde_json::from_str(r#"{"canVerify":true}"#).unwrap();
        assert_eq!(parsed, GrantPermissions::default().with_verify());
    }
}
