//! Upload service
//!
//! Validates image uploads and hands them to object storage under a
//! generated name.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::ports::{ObjectStorage, StoredObject};
use crate::error::{AppError, DomainError};

pub const BANNER_MAX_BYTES: usize = 1024 * 1024;
pub const GENERAL_MAX_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
];

const DEFAULT_FOLDER: &str = "general";
const BANNER_FOLDER: &str = "banners";

/// Upload flavour; decides the size ceiling and default folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Banner,
    General,
}

impl UploadKind {
    pub fn max_bytes(self) -> usize {
        match self {
            UploadKind::Banner => BANNER_MAX_BYTES,
            UploadKind::General => GENERAL_MAX_BYTES,
        }
    }
}

/// File extension for an allowed content type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Reduce a client-supplied folder name to `[a-z0-9_-]`
fn sanitize_folder(folder: &str) -> String {
    folder
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    pub async fn upload(
        &self,
        kind: UploadKind,
        folder: Option<&str>,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, AppError> {
        let ext = extension_for(content_type).ok_or_else(|| {
            DomainError::Validation(format!(
                "Unsupported file type '{}'; allowed: JPEG, PNG, WebP, GIF, SVG",
                content_type
            ))
        })?;
        if bytes.is_empty() {
            return Err(DomainError::Validation("Uploaded file is empty".to_string()).into());
        }
        if bytes.len() > kind.max_bytes() {
            return Err(DomainError::Validation(format!(
                "File is too large; the limit is {} MB",
                kind.max_bytes() / (1024 * 1024)
            ))
            .into());
        }

        let folder = match kind {
            UploadKind::Banner => BANNER_FOLDER.to_string(),
            UploadKind::General => folder
                .map(sanitize_folder)
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
        };
        let path = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);
        let content_type = ALLOWED_TYPES
            .iter()
            .find(|(_, e)| *e == ext)
            .map_or(content_type, |(mime, _)| *mime);

        let stored = self.storage.put(&path, bytes, content_type).await?;
        tracing::info!(path = %stored.path, size = stored.size, "File uploaded");
        Ok(stored)
    }
}
