//! Object storage port
//!
//! Uploaded files are written under a relative object path and served from a
//! public URL.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::StorageError;

/// A stored object and where the public can fetch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub path: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `bytes` at `path`, replacing any existing object
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// Reject absolute paths, `..` segments and anything outside `[A-Za-z0-9._/-]`
pub fn validate_object_path(path: &str) -> Result<(), StorageError> {
    let valid = !path.is_empty()
        && !path.starts_with('/')
        && path.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(format!(
            "invalid object path: {}",
            path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_are_confined() {
        assert!(validate_object_path("banners/abc.png").is_ok());
        assert!(validate_object_path("../etc/passwd").is_err());
        assert!(validate_object_path("/abs.png").is_err());
        assert!(validate_object_path("a//b.png").is_err());
        assert!(validate_object_path("a/b c.png").is_err());
        assert!(validate_object_path("").is_err());
    }
}
