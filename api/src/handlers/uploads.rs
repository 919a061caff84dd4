//! Upload handlers
//!
//! `multipart/form-data` with a `file` part and an optional `folder` part.

use axum::extract::{multipart::MultipartRejection, Multipart, State};

use crate::app::UploadKind;
use crate::auth::AdminAccess;
use crate::domain::ports::StoredObject;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::AppState;

struct UploadForm {
    folder: Option<String>,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut folder = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((content_type, bytes.to_vec()));
            }
            Some("folder") => folder = Some(field.text().await?),
            _ => {}
        }
    }

    let (content_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    Ok(UploadForm {
        folder,
        content_type,
        bytes,
    })
}

async fn handle(
    state: &AppState,
    kind: UploadKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<StoredObject>, AppError> {
    let form = read_form(multipart?).await?;
    let stored = state
        .uploads
        .upload(kind, form.folder.as_deref(), &form.content_type, form.bytes)
        .await?;
    Ok(ApiResponse::created("File uploaded successfully", stored))
}

/// POST /api/upload
pub async fn upload_file(
    _admin: AdminAccess,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<StoredObject>, AppError> {
    handle(&state, UploadKind::General, multipart).await
}

/// POST /api/banners/upload
pub async fn upload_banner(
    _admin: AdminAccess,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<StoredObject>, AppError> {
    handle(&state, UploadKind::Banner, multipart).await
}
