//! The access-control evaluator.
//!
//! Deciding whether a user may perform an operation on a document is a pure
//! function of who owns the document, which users hold a grant for it, and
//! the operation requested. Nothing here touches storage or the clock.
//!
//! | relation \ operation | view | download | sign      | verify      | delete | share | revoke | list grants |
//! |----------------------|------|----------|-----------|-------------|--------|-------|--------|-------------|
//! | owner                | yes  | yes      | yes       | yes         | yes    | yes   | yes    | yes         |
//! | grantee              | yes  | yes      | can_sign  | can_verify  | no     | no    | no     | no          |
//! | stranger             | no   | no       | no        | no          | no     | no    | no     | no          |
//!
//! Grantees never re-share: there is no transitive sharing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentMeta;
use crate::grant::{GrantPermissions, PermissionGrant};
use crate::types::{DocumentId, UserId};

/// Something a user may try to do with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read the metadata.
    View,
    /// Read the content.
    Download,
    /// Add a signature.
    Sign,
    /// Check the content and signatures.
    Verify,
    /// Remove the document and all its grants.
    Delete,
    /// Grant another user access.
    Share,
    /// Withdraw a grant.
    Revoke,
    /// Enumerate who holds grants.
    ListGrants,
}

impl Operation {
    /// All operations, for exhaustive checks.
    pub const ALL: [Operation; 8] = [
        Operation::View,
        Operation::Download,
        Operation::Sign,
        Operation::Verify,
        Operation::Delete,
        Operation::Share,
        Operation::Revoke,
        Operation::ListGrants,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::View => "view",
            Operation::Download => "download",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
            Operation::Delete => "delete",
            Operation::Share => "share",
            Operation::Revoke => "revoke",
            Operation::ListGrants => "list_grants",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a user relates to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Owner,
    /// Holds a grant with these rights.
    Grantee(GrantPermissions),
    Stranger,
}

/// Decide an operation from the relation alone.
///
/// This is the whole policy. Everything else classifies the relation.
pub const fn decide(relation: Relation, operation: Operation) -> bool {
    match (relation, operation) {
        (Relation::Owner, _) => true,
        (Relation::Grantee(_), Operation::View | Operation::Download) => true,
        (Relation::Grantee(p), Operation::Sign) => p.can_sign,
        (Relation::Grantee(p), Operation::Verify) => p.can_verify,
        _ => false,
    }
}

/// The grantees of a single document.
///
/// Built from grant rows. Grants for any other document are ignored, so a
/// state can never leak access across documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessState {
    document_id: Option<DocumentId>,
    grantees: BTreeMap<UserId, GrantPermissions>,
}

impl AccessState {
    /// An empty state for a document nobody has been granted.
    pub fn new(document_id: DocumentId) -> Self {
        Self {
            document_id: Some(document_id),
            grantees: BTreeMap::new(),
        }
    }

    /// Build the state for `document_id` from a set of grants.
    pub fn from_grants<'a>(
        document_id: DocumentId,
        grants: impl IntoIterator<Item = &'a PermissionGrant>,
    ) -> Self {
        let mut state = Self::new(document_id);
        for grant in grants {
            state.apply_grant(grant);
        }
        state
    }

    /// Record a grant. Returns false if it belongs to another document or
    /// the grantee was already recorded; the first grant's rights stand.
    pub fn apply_grant(&mut self, grant: &PermissionGrant) -> bool {
        if self.document_id != Some(grant.document_id) || self.has_grant(&grant.grantee_id) {
            return false;
        }
        self.grantees
            .insert(grant.grantee_id.clone(), grant.permissions);
        true
    }

    /// Remove a grantee. Returns whether one was present.
    pub fn apply_revoke(&mut self, grantee: &UserId) -> bool {
        self.grantees.remove(grantee).is_some()
    }

    /// Whether `user` holds a grant.
    pub fn has_grant(&self, user: &UserId) -> bool {
        self.grantees.contains_key(user)
    }

    /// The rights `user`'s grant carries, if any.
    pub fn permissions(&self, user: &UserId) -> Option<GrantPermissions> {
        self.grantees.get(user).copied()
    }

    /// Number of grantees.
    pub fn len(&self) -> usize {
        self.grantees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grantees.is_empty()
    }

    /// Classify `user` against `document`.
    ///
    /// Ownership wins over a grant; a state built for another document
    /// contributes nothing.
    pub fn relation(&self, user: &UserId, document: &DocumentMeta) -> Relation {
        if document.is_owned_by(user) {
            Relation::Owner
        } else if self.document_id != Some(document.id) {
            Relation::Stranger
        } else {
            match self.permissions(user) {
                Some(permissions) => Relation::Grantee(permissions),
                None => Relation::Stranger,
            }
        }
    }
}

/// Whether `user` may perform `operation` on `document`, given its grants.
///
/// Total and deterministic: defined for every input, with no dependence on
/// time or ordering.
pub fn can_access(
    user: &UserId,
    document: &DocumentMeta,
    grants: &AccessState,
    operation: Operation,
) -> bool {
    decide(grants.relation(user, document), operation)
}
