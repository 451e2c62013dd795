//! Handlers for the `/uploads` resource (editor image uploads).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::uploads::{content_type_for, object_key, prefixes, validate_image_name};
use serde::Serialize;

use super::multipart::MultipartForm;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Location of a stored image.
#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub key: String,
}

/// POST /api/v1/uploads/images
///
/// Multipart form with a single `file` part. Returns the public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart, "file").await?;
    let file = form.take_file("file")?;
    validate_image_name(&file.file_name)?;

    let key = object_key(prefixes::IMAGES, &file.file_name);
    let size = file.bytes.len();
    state
        .storage
        .put(&key, file.bytes, content_type_for(&file.file_name))
        .await?;

    tracing::info!(key = %key, size, user_id = admin.user_id, "Image uploaded");

    let url = state.storage.public_url(&key);
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadedImage { url, key },
        }),
    ))
}
