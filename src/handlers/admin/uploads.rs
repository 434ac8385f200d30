use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};

use super::Deleted;
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::util::{UPSTREAM_TIMEOUT, require_fields, with_timeout};

const DEFAULT_FOLDER: &str = "packages";

/// Request body cap for image uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub path: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUpload {
    pub path: Option<String>,
}

/// Folder names are single path segments or nested plain segments.
pub fn sanitize_folder(folder: Option<&str>) -> Result<String> {
    let folder = folder.map(|f| f.trim().trim_matches('/')).unwrap_or_default();
    if folder.is_empty() {
        return Ok(DEFAULT_FOLDER.to_string());
    }
    let valid = folder.split('/').all(|seg| {
        !seg.is_empty()
            && seg != "."
            && seg != ".."
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });
    if !valid {
        return Err(AppError::BadRequest(format!("Invalid folder: {}", folder)));
    }
    Ok(folder.to_string())
}

/// File extension from the upload's name, falling back to its content type.
pub fn file_extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    from_name.unwrap_or_else(|| {
        match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
        .to_string()
    })
}

/// Multipart image upload (`file`, optional `folder`) to the storage bucket.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut folder: Option<String> = None;
    let mut file: Option<(Option<String>, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("folder") => folder = Some(field.text().await?),
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::missing_field("file"))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let folder = sanitize_folder(folder.as_deref())?;
    let path = format!(
        "{}/{}.{}",
        folder,
        uuid::Uuid::new_v4(),
        file_extension(file_name.as_deref(), &content_type)
    );
    let size = bytes.len();

    with_timeout(
        UPSTREAM_TIMEOUT,
        "image upload",
        state.db.upload_object(&path, &content_type, bytes),
    )
    .await?;

    tracing::info!(path = %path, size, "Image uploaded");
    let url = state.db.public_url(&path);
    Ok(Json(UploadResponse { path, url }))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Json(input): Json<DeleteUpload>,
) -> Result<Json<Deleted>> {
    require_fields(&[("path", input.path.as_deref())])?;
    let path = input.path.unwrap_or_default().trim().to_string();
    state.db.delete_objects(&[path.clone()]).await?;
    tracing::info!(path = %path, "Image deleted");
    Ok(Json(Deleted { success: true }))
}
