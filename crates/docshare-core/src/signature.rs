//! Signatures and verifications.
//!
//! A signer supplies opaque signature data (for example a drawn signature).
//! The service binds it to the document's content hash, the signer and the
//! time, and countersigns the result with its attestation key.
//!
//! Verifying a document re-hashes the content and re-checks every
//! signature's attestation. The document is authentic only if all of them
//! still hold.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::document::{Document, DocumentMeta};
use crate::error::ValidationError;
use crate::types::{ContentHash, DocumentId, SignatureId, UserId, VerificationId};

/// Largest accepted signature payload (1 MiB).
pub const MAX_SIGNATURE_DATA_LEN: usize = 1024 * 1024;

pub const MAX_VERIFICATION_METHOD_LEN: usize = 50;
pub const MAX_VERIFICATION_NOTES_LEN: usize = 1000;

/// Method recorded when the verifier names none.
pub const DEFAULT_VERIFICATION_METHOD: &str = "automated";

/// Domain separator for attestation messages.
const ATTESTATION_DOMAIN: &[u8] = b"docshare/signature/v1";

/// One user's signature on one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub id: SignatureId,
    pub document_id: DocumentId,
    pub signer_id: UserId,
    /// Opaque payload supplied by the signer.
    pub signature_data: Bytes,
    /// Content hash of the document when it was signed.
    pub content_hash: ContentHash,
    /// Signing time (Unix ms).
    pub signed_at: i64,
    /// Key that produced `attestation`.
    pub attested_by: Ed25519PublicKey,
    pub attestation: Ed25519Signature,
}

/// Result of checking one signature record against a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    /// The record belongs to another document.
    WrongDocument,
    /// Attested by a key other than the trusted one.
    UntrustedKey,
    /// The attestation does not match the record.
    BadAttestation,
    /// The document content changed after signing.
    ContentChanged,
}

impl SignatureRecord {
    /// Build and countersign a record. The store assigns the id.
    pub fn attest(
        keypair: &Keypair,
        document: &DocumentMeta,
        signer: &UserId,
        signature_data: Bytes,
        signed_at: i64,
    ) -> Self {
        let mut record = Self {
            id: SignatureId(0),
            document_id: document.id,
            signer_id: signer.clone(),
            signature_data,
            content_hash: document.content_hash,
            signed_at,
            attested_by: keypair.public_key(),
            attestation: Ed25519Signature([0u8; 64]),
        };
        record.attestation = keypair.sign(&record.attestation_message());
        record
    }

    /// The bytes covered by the attestation.
    ///
    /// The id is excluded: it is assigned after signing.
    pub fn attestation_message(&self) -> Vec<u8> {
        let signer = self.signer_id.as_str().as_bytes();
        let mut msg = Vec::with_capacity(ATTESTATION_DOMAIN.len() + signer.len() + 84);

        msg.extend_from_slice(ATTESTATION_DOMAIN);
        msg.extend_from_slice(&self.document_id.0.to_be_bytes());
        msg.extend_from_slice(&(signer.len() as u32).to_be_bytes());
        msg.extend_from_slice(signer);
        msg.extend_from_slice(self.content_hash.as_bytes());
        msg.extend_from_slice(ContentHash::of(&self.signature_data).as_bytes());
        msg.extend_from_slice(&self.signed_at.to_be_bytes());
        msg
    }

    /// Check this record against `document` and the trusted key.
    pub fn check(&self, document: &Document, trusted: &Ed25519PublicKey) -> SignatureCheck {
        if self.document_id != document.id {
            return SignatureCheck::WrongDocument;
        }
        if &self.attested_by != trusted {
            return SignatureCheck::UntrustedKey;
        }
        if trusted
            .verify(&self.attestation_message(), &self.attestation)
            .is_err()
        {
            return SignatureCheck::BadAttestation;
        }
        if self.content_hash != document.content_hash {
            return SignatureCheck::ContentChanged;
        }
        SignatureCheck::Valid
    }
}

/// Check signature data before it is attested.
pub fn validate_signature_data(data: &[u8]) -> Result<(), ValidationError> {
    if data.is_empty() {
        return Err(ValidationError::EmptySignature);
    }
    if data.len() > MAX_SIGNATURE_DATA_LEN {
        return Err(ValidationError::SignatureTooLarge {
            size: data.len(),
            limit: MAX_SIGNATURE_DATA_LEN,
        });
    }
    Ok(())
}

/// What a verifier submits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationRequest {
    /// How the verifier checked the document. Blank means automated.
    pub method: String,
    pub notes: String,
}

impl VerificationRequest {
    pub fn new(method: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            notes: notes.into(),
        }
    }

    /// The method to record.
    pub fn method(&self) -> &str {
        match self.method.trim() {
            "" => DEFAULT_VERIFICATION_METHOD,
            method => method,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.method().chars().count() > MAX_VERIFICATION_METHOD_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "verification_method",
                max: MAX_VERIFICATION_METHOD_LEN,
            });
        }
        if self.notes.chars().count() > MAX_VERIFICATION_NOTES_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "verification_notes",
                max: MAX_VERIFICATION_NOTES_LEN,
            });
        }
        Ok(())
    }
}

/// What verifying a document found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// The content still matches its recorded hash.
    pub content_intact: bool,
    pub signatures_checked: u32,
    pub signatures_valid: u32,
}

impl VerificationOutcome {
    pub fn authentic(&self) -> bool {
        self.content_intact && self.signatures_valid == self.signatures_checked
    }
}

/// Verify a document's content and every signature on it.
pub fn verify_document(
    document: &Document,
    signatures: &[SignatureRecord],
    trusted: &Ed25519PublicKey,
) -> VerificationOutcome {
    let signatures_valid = signatures
        .iter()
        .filter(|s| s.check(document, trusted) == SignatureCheck::Valid)
        .count() as u32;

    VerificationOutcome {
        content_intact: document.verify_content().is_ok(),
        signatures_checked: signatures.len() as u32,
        signatures_valid,
    }
}

/// A completed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: VerificationId,
    pub document_id: DocumentId,
    pub verifier_id: UserId,
    pub method: String,
    pub notes: String,
    pub authentic: bool,
    pub signatures_checked: u32,
    /// Verification time (Unix ms).
    pub verified_at: i64,
}

impl VerificationRecord {
    /// Record an outcome. The store assigns the id.
    pub fn new(
        document_id: DocumentId,
        verifier: &UserId,
        request: &VerificationRequest,
        outcome: &VerificationOutcome,
        verified_at: i64,
    ) -> Self {
        Self {
            id: VerificationId(0),
            document_id,
            verifier_id: verifier.clone(),
            method: request.method().to_string(),
            notes: request.notes.clone(),
            authentic: outcome.authentic(),
            signatures_checked: outcome.signatures_checked,
            verified_at,
        }
    }
}

/// The most recent verification, which decides whether a document counts
/// as verified.
pub fn latest_verification(records: &[VerificationRecord]) -> Option<&VerificationRecord> {
    records.iter().max_by_key(|v| (v.verified_at, v.id))
}
