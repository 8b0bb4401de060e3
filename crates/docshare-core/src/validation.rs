//! Upload validation.
//!
//! Which files may be stored is configuration: an allow-list of content
//! types, an allow-list of extensions, and a size ceiling. Both allow-lists
//! must accept a file for it to be stored.

use serde::{Deserialize, Serialize};

use crate::document::NewDocument;
use crate::error::ValidationError;

/// 50 MiB.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Column limits of the documents table.
pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_CONTENT_TYPE_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 50;

/// What uploads are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    /// Largest accepted file, in bytes.
    pub max_size_bytes: u64,
    /// Accepted MIME types, compared case-insensitively.
    pub allowed_content_types: Vec<String>,
    /// Accepted extensions with leading dot, compared case-insensitively.
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    /// PDF documents only.
    pub fn pdf_only() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            allowed_content_types: vec!["application/pdf".into()],
            allowed_extensions: vec![".pdf".into()],
        }
    }

    /// PDF, images and Word documents.
    pub fn office_documents() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            allowed_content_types: vec![
                "application/pdf".into(),
                "image/jpeg".into(),
                "image/png".into(),
                "application/msword".into(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
            ],
            allowed_extensions: vec![
                ".pdf".into(),
                ".jpg".into(),
                ".jpeg".into(),
                ".png".into(),
                ".doc".into(),
                ".docx".into(),
            ],
        }
    }

    /// Set the size ceiling.
    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn allows_content_type(&self, content_type: &str) -> bool {
        // Parameters such as "; charset=binary" are not part of the type.
        let essence = content_type.split(';').next().unwrap_or("").trim();
        self.allowed_content_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::pdf_only()
    }
}

/// Validate an upload against a policy.
///
/// Checks, in order:
/// - Content is present
/// - Declared size equals the content length
/// - Size is within the ceiling
/// - File name is present and fits its column
/// - Content type is allowed and fits its column
/// - Extension is allowed
/// - Category fits its column
pub fn validate_upload(upload: &NewDocument, policy: &UploadPolicy) -> Result<(), ValidationError> {
    let actual = upload.content.len() as u64;

    // 1. Something to store
    if actual == 0 {
        return Err(ValidationError::EmptyContent);
    }

    // 2. Transport and payload agree
    if upload.declared_size != actual {
        return Err(ValidationError::SizeMismatch {
            declared: upload.declared_size,
            actual,
        });
    }

    // 3. Size ceiling
    if actual > policy.max_size_bytes {
        return Err(ValidationError::TooLarge {
            size: actual,
            limit: policy.max_size_bytes,
        });
    }

    // 4. File name
    if upload.file_name.trim().is_empty() {
        return Err(ValidationError::MissingFileName);
    }
    if upload.file_name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(ValidationError::FieldTooLong {
            field: "file_name",
            max: MAX_FILE_NAME_LEN,
        });
    }

    // 5. Content type
    if upload.content_type.chars().count() > MAX_CONTENT_TYPE_LEN {
        return Err(ValidationError::FieldTooLong {
            field: "content_type",
            max: MAX_CONTENT_TYPE_LEN,
        });
    }
    if !policy.allows_content_type(&upload.content_type) {
        return Err(ValidationError::ContentTypeNotAllowed(
            upload.content_type.clone(),
        ));
    }

    // 6. Extension
    match upload.extension() {
        Some(ext) if policy.allows_extension(&ext) => {}
        Some(ext) => return Err(ValidationError::ExtensionNotAllowed(ext)),
        None => return Err(ValidationError::ExtensionNotAllowed(String::new())),
    }

    // 7. Category
    if upload.category.chars().count() > MAX_CATEGORY_LEN {
        return Err(ValidationError::FieldTooLong {
            field: "category",
            max: MAX_CATEGORY_LEN,
        });
    }

    Ok(())
}
