//! Response structs returned by the service.
//!
//! These are what a presentation layer serializes. Field names are camelCase
//! on the wire.

use bytes::Bytes;
use serde::Serialize;

use docshare_core::{
    format_size, DocumentId, DocumentMeta, GrantId, GrantPermissions, ListedDocument,
    PermissionGrant, SignatureId, SignatureRecord, User, UserId, VerificationRecord,
};

/// A document as listed to a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: DocumentId,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub formatted_size: String,
    pub uploaded_at: i64,
    pub description: String,
    pub category: String,
    /// Whether the viewer owns the document.
    pub is_owner: bool,
    /// At least one signature exists.
    pub is_signed: bool,
    /// The latest verification found the document authentic.
    pub is_verified: bool,
    /// When the document was shared with the viewer. Null for the owner.
    pub shared_at: Option<i64>,
}

impl DocumentDto {
    /// Describe a freshly stored `meta` as seen by `viewer`.
    pub fn from_meta(meta: &DocumentMeta, viewer: &UserId) -> Self {
        Self::from_listing(&ListedDocument::owned(meta.clone()), viewer)
    }

    /// Describe a listing entry as seen by `viewer`.
    pub fn from_listing(listed: &ListedDocument, viewer: &UserId) -> Self {
        let meta = &listed.meta;
        Self {
            id: meta.id,
            file_name: meta.file_name.clone(),
            content_type: meta.content_type.clone(),
            size: meta.size_bytes,
            formatted_size: format_size(meta.size_bytes),
            uploaded_at: meta.uploaded_at,
            description: meta.description.clone(),
            category: meta.category.clone(),
            is_owner: meta.is_owned_by(viewer),
            is_signed: listed.is_signed,
            is_verified: listed.is_verified,
            shared_at: listed.shared_at,
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.user_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Full metadata for a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(flatten)]
    pub document: DocumentDto,
    /// Blake3 of the content, hex encoded.
    pub content_hash: String,
    pub owner: UserSummary,
    /// Signatures, oldest first.
    pub signatures: Vec<SignatureDto>,
    /// The latest verification, if any.
    pub verification: Option<VerificationDto>,
}

/// A document's content, ready to be streamed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    /// Sent as the response body, not as a field.
    #[serde(skip)]
    pub content: Bytes,
}

/// A grant as shown to the document owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantDto {
    pub id: GrantId,
    pub document_id: DocumentId,
    pub grantee: UserSummary,
    #[serde(flatten)]
    pub permissions: GrantPermissions,
    pub granted_at: i64,
}

impl GrantDto {
    pub fn new(grant: &PermissionGrant, grantee: &User) -> Self {
        Self {
            id: grant.id,
            document_id: grant.document_id,
            grantee: UserSummary::from(grantee),
            permissions: grant.permissions,
            granted_at: grant.granted_at,
        }
    }
}

/// A signature as shown to viewers of the document.
///
/// The signature data itself is not echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDto {
    pub id: SignatureId,
    pub document_id: DocumentId,
    pub signer: UserSummary,
    pub signed_at: i64,
    /// Content hash at signing time, hex encoded.
    pub content_hash: String,
    /// Attestation key, hex encoded.
    pub attested_by: String,
}

impl SignatureDto {
    pub fn new(signature: &SignatureRecord, signer: &User) -> Self {
        Self {
            id: signature.id,
            document_id: signature.document_id,
            signer: UserSummary::from(signer),
            signed_at: signature.signed_at,
            content_hash: signature.content_hash.to_hex(),
            attested_by: signature.attested_by.to_hex(),
        }
    }
}

/// The outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDto {
    /// Display id, `VER-<n>`.
    pub id: String,
    pub document_id: DocumentId,
    pub verifier: UserSummary,
    pub method: String,
    pub notes: String,
    pub authentic: bool,
    pub signatures_checked: u32,
    pub verified_at: i64,
    pub message: String,
}

impl VerificationDto {
    pub fn new(verification: &VerificationRecord, verifier: &User) -> Self {
        let message = if verification.authentic {
            "Document is authentic"
        } else {
            "Document failed verification"
        };

        Self {
            id: verification.id.to_string(),
            document_id: verification.document_id,
            verifier: UserSummary::from(verifier),
            method: verification.method.clone(),
            notes: verification.notes.clone(),
            authentic: verification.authentic,
            signatures_checked: verification.signatures_checked,
            verified_at: verification.verified_at,
            message: message.to_string(),
        }
    }
}
