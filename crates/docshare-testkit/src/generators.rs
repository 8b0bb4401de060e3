//! Proptest generators for property-based testing.

use proptest::prelude::*;

use docshare_core::{GrantPermissions, NewDocument, Operation};

/// Number of seeded users the action generators pick from.
pub const USERS: usize = 3;

/// Index into the seeded users.
pub fn user_index() -> impl Strategy<Value = usize> {
    0..USERS
}

/// Generate an Operation.
pub fn operation() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Any combination of sign and verify rights.
pub fn grant_permissions() -> impl Strategy<Value = GrantPermissions> {
    (any::<bool>(), any::<bool>()).prop_map(|(can_sign, can_verify)| GrantPermissions {
        can_sign,
        can_verify,
    })
}

/// A file name with an extension that may or may not be accepted.
pub fn file_name() -> impl Strategy<Value = String> {
    (
        "[a-z][a-z0-9_-]{0,15}",
        prop::sample::select(vec![".pdf", ".PDF", ".Pdf", ".docx", ".txt", ""]),
    )
        .prop_map(|(stem, ext)| format!("{}{}", stem, ext))
}

/// A content type that may or may not be accepted.
pub fn content_type() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "application/pdf",
        "APPLICATION/PDF",
        "application/pdf; charset=binary",
        "image/png",
        "text/plain",
    ])
    .prop_map(String::from)
}

/// An arbitrary small upload.
pub fn upload() -> impl Strategy<Value = NewDocument> {
    (
        file_name(),
        content_type(),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(name, ct, content)| NewDocument::new(name, ct, content))
}

/// One step in a sharing script.
///
/// `doc` indexes the documents uploaded so far (modulo their count), so a
/// script stays meaningful however many uploads precede it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Upload { owner: usize },
    Share {
        doc: usize,
        actor: usize,
        target: usize,
        permissions: GrantPermissions,
    },
    Revoke { doc: usize, actor: usize, target: usize },
    Delete { doc: usize, actor: usize },
}

/// Generate a single Action, weighted towards uploads and shares.
pub fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        2 => user_index().prop_map(|owner| Action::Upload { owner }),
        4 => (any::<usize>(), user_index(), user_index(), grant_permissions())
            .prop_map(|(doc, actor, target, permissions)| Action::Share {
                doc,
                actor,
                target,
                permissions,
            }),
        1 => (any::<usize>(), user_index(), user_index())
            .prop_map(|(doc, actor, target)| Action::Revoke { doc, actor, target }),
        1 => (any::<usize>(), user_index())
            .prop_map(|(doc, actor)| Action::Delete { doc, actor }),
    ]
}

/// A script of 1..=max_len actions.
pub fn actions(max_len: usize) -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(action(), 1..=max_len)
}
