//! Service configuration.

use docshare_core::UploadPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the [`DocumentService`](crate::DocumentService).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Which uploads are accepted.
    pub upload: UploadPolicy,
}

impl ServiceConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Replace the upload policy.
    pub fn with_upload(mut self, upload: UploadPolicy) -> Self {
        self.upload = upload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshare_core::DEFAULT_MAX_SIZE_BYTES;

    #[test]
    fn test_default_is_pdf_only() {
        let config = ServiceConfig::default();
        assert_eq!(config.upload, UploadPolicy::pdf_only());
        assert_eq!(config.upload.max_size_bytes, DEFAULT_MAX_SIZE_BYTES);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ServiceConfig::from_json(r#"{"upload": {"max_size_bytes": 1024}}"#).unwrap();
        assert_eq!(config.upload.max_size_bytes, 1024);
        assert_eq!(config.upload.allowed_extensions, vec![".pdf".to_string()]);

        let empty = ServiceConfig::from_json("{}").unwrap();
        assert_eq!(empty, ServiceConfig::default());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(ServiceConfig::from_json("not json").is_err());
    }
}
