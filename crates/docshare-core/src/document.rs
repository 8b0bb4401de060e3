//! Documents: uploaded blobs owned by exactly one user.
//!
//! A [`NewDocument`] is what the upload layer hands over. The store turns it
//! into a [`Document`] by assigning an id, the owner and the upload time.
//! Listings and metadata work on [`DocumentMeta`], which carries everything
//! except the blob.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{ContentHash, DocumentId, UserId};

/// Category assigned when the uploader does not pick one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// An upload request that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub file_name: String,
    pub content_type: String,
    pub content: Bytes,
    /// Size reported by the transport. Must equal `content.len()`.
    pub declared_size: u64,
    pub description: String,
    pub category: String,
}

impl NewDocument {
    /// Start an upload with the given file name, content type and content.
    ///
    /// The declared size defaults to the content length.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            declared_size: content.len() as u64,
            content,
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Override the size reported by the transport.
    pub fn declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    /// Lowercased file extension including the leading dot, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name.rsplit(['/', '\\']).next().unwrap_or("");
        match name.rfind('.') {
            Some(idx) if idx + 1 < name.len() => Some(name[idx..].to_lowercase()),
            _ => None,
        }
    }
}

/// A stored document including its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub owner_id: UserId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub content: Bytes,
    pub content_hash: ContentHash,
    pub description: String,
    pub category: String,
    /// Upload time (Unix ms).
    pub uploaded_at: i64,
}

impl Document {
    /// Materialize a new document from an upload.
    pub fn from_upload(
        id: DocumentId,
        owner_id: UserId,
        upload: &NewDocument,
        uploaded_at: i64,
    ) -> Self {
        Self {
            id,
            owner_id,
            file_name: upload.file_name.clone(),
            content_type: upload.content_type.clone(),
            size_bytes: upload.content.len() as u64,
            content_hash: ContentHash::of(&upload.content),
            content: upload.content.clone(),
            description: upload.description.clone(),
            category: upload.category.clone(),
            uploaded_at,
        }
    }

    /// Drop the blob, keeping the metadata.
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            id: self.id,
            owner_id: self.owner_id.clone(),
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.size_bytes,
            content_hash: self.content_hash,
            description: self.description.clone(),
            category: self.category.clone(),
            uploaded_at: self.uploaded_at,
        }
    }

    /// Check the stored content against its recorded hash.
    pub fn verify_content(&self) -> Result<(), CoreError> {
        let actual = ContentHash::of(&self.content);
        if actual != self.content_hash {
            return Err(CoreError::ContentHashMismatch {
                expected: self.content_hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(())
    }
}

/// Document metadata without the content blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: DocumentId,
    pub owner_id: UserId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub content_hash: ContentHash,
    pub description: String,
    pub category: String,
    pub uploaded_at: i64,
}

impl DocumentMeta {
    /// Whether `user` owns this document.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }
}

/// A document as it appears in one user's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedDocument {
    pub meta: DocumentMeta,
    /// When the viewer was granted access. None for the owner.
    pub shared_at: Option<i64>,
    /// At least one signature exists.
    pub is_signed: bool,
    /// The latest verification found the document authentic.
    pub is_verified: bool,
}

impl ListedDocument {
    /// An owned, unsigned, unverified listing entry.
    pub fn owned(meta: DocumentMeta) -> Self {
        Self {
            meta,
            shared_at: None,
            is_signed: false,
            is_verified: false,
        }
    }
}

/// Human-readable size: bytes below 1 KiB, whole KB below 1 MiB, else whole MB.
pub fn format_size(size: u64) -> String {
    match size {
        s if s < 1024 => format!("{} bytes", s),
        s if s < 1024 * 1024 => format!("{} KB", s / 1024),
        s => format!("{} MB", s / (1024 * 1024)),
    }
}
