//! Filesystem-backed object storage
//!
//! Objects are written beneath a root directory that the HTTP server exposes
//! at `/uploads`, so an object at `banners/x.png` is public at
//! `{public_base_url}/uploads/banners/x.png`.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::ports::{validate_object_path, ObjectStorage, StoredObject};
use crate::error::StorageError;

pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, path)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_object_path(path)?;
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let size = bytes.len();
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(path = %path, size, "Stored object");

        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(path),
            content_type: content_type.to_string(),
            size,
        })
    }
}
