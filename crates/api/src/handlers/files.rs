//! Handlers for the downloadable file catalogue, file purchases and
//! presigned downloads.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::payment::{validate_pricing, DEFAULT_CURRENCY};
use eduportal_core::slug::resolve_slug;
use eduportal_core::status::PricingModel;
use eduportal_core::types::{DbId, MinorUnits};
use eduportal_core::uploads::{content_type_for, object_key, prefixes};
use eduportal_db::models::file::{
    DownloadableFile, NewDownloadableFile, PurchaseFileRequest, UpdateDownloadableFile,
};
use eduportal_db::models::payment::VerifyPaymentRequest;
use eduportal_db::repositories::{FileRepo, PurchasedFileRepo};
use serde::Serialize;
use validator::Validate;

use super::carousel::remove_object;
use super::checkout::{self, verify_checkout, FileLedger};
use super::multipart::MultipartForm;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A time-limited download link.
#[derive(Debug, Serialize)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
    pub expires_in: u64,
}

/// Amount a buyer pays for `file`.
fn file_price(file: &DownloadableFile) -> MinorUnits {
    if file.is_free {
        0
    } else {
        file.price_paise
    }
}

fn pricing_model(is_free: bool) -> PricingModel {
    if is_free {
        PricingModel::Free
    } else {
        PricingModel::Paid
    }
}

fn file_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "DownloadableFile",
        id,
    })
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// GET /api/v1/files?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let files = FileRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: files }))
}

/// GET /api/v1/files/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let file = FileRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or(AppError::Core(CoreError::NotFoundBySlug {
            entity: "DownloadableFile",
            slug,
        }))?;
    Ok(Json(DataResponse { data: file }))
}

/// POST /api/v1/files
///
/// Multipart: `title`, `slug`, `description`, `is_free`, `price_paise`,
/// `currency` and the `file` itself.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart, "file").await?;
    let upload = form.take_file("file")?;

    let title = form.required_text("title")?;
    let slug = resolve_slug(form.text("slug").as_deref(), &title)?;
    let is_free = form.flag("is_free")?.unwrap_or(false);
    let price_paise = form.parsed::<MinorUnits>("price_paise")?.unwrap_or(0);
    validate_pricing(pricing_model(is_free), price_paise, None)?;

    let key = object_key(prefixes::FILES, &upload.file_name);
    let content_type = content_type_for(&upload.file_name).to_string();
    let input = NewDownloadableFile {
        title,
        slug,
        description: form.text("description"),
        object_key: key.clone(),
        file_name: upload.file_name,
        content_type,
        size_bytes: upload.bytes.len() as i64,
        is_free,
        price_paise,
        currency: form
            .text("currency")
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    };
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    state
        .storage
        .put(&key, upload.bytes, &input.content_type)
        .await?;

    let file = match FileRepo::create(&state.pool, &input).await {
        Ok(file) => file,
        Err(e) => {
            remove_object(&state, Some(key)).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        file_id = file.id,
        size = file.size_bytes,
        is_free = file.is_free,
        user_id = admin.user_id,
        "File uploaded",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: file })))
}

/// PUT /api/v1/files/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(mut input): ValidatedJson<UpdateDownloadableFile>,
) -> AppResult<impl IntoResponse> {
    let existing = FileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    let slug = input
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), ""))
        .transpose()?;
    let is_free = input.is_free.unwrap_or(existing.is_free);
    if is_free && input.price_paise.is_none() {
        input.price_paise = Some(0);
    }
    validate_pricing(
        pricing_model(is_free),
        input.price_paise.unwrap_or(existing.price_paise),
        None,
    )?;

    let file = FileRepo::update(&state.pool, id, &input, slug.as_deref())
        .await?
        .ok_or_else(|| file_not_found(id))?;
    Ok(Json(DataResponse { data: file }))
}

/// DELETE /api/v1/files/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let file = FileRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    remove_object(&state, Some(file.object_key)).await;
    tracing::info!(file_id = id, user_id = admin.user_id, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

/// POST /api/v1/files/purchase
pub async fn purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<PurchaseFileRequest>,
) -> AppResult<impl IntoResponse> {
    let file = FileRepo::find_by_id(&state.pool, input.file_id)
        .await?
        .ok_or_else(|| file_not_found(input.file_id))?;

    let (status, response) = checkout::purchase::<FileLedger>(
        &state,
        auth.user_id,
        file.id,
        file_price(&file),
        &file.currency,
    )
    .await?;
    Ok((status, Json(DataResponse { data: response })))
}

/// POST /api/v1/files/verify-payment
pub async fn verify_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<VerifyPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let response = verify_checkout::<FileLedger>(&state, auth.user_id, &input).await?;
    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/files/{id}/download
///
/// Presigned URL for free files, purchased files and admins; 403 otherwise.
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let file = FileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    let allowed = auth.is_admin()
        || file_price(&file) == 0
        || PurchasedFileRepo::find(&state.pool, auth.user_id, id)
            .await?
            .is_some();
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "Purchase this file to download it".into(),
        )));
    }

    let url = state
        .storage
        .presigned_get(&file.object_key, &file.file_name)
        .await?;

    tracing::info!(file_id = id, user_id = auth.user_id, "Download link issued");

    Ok(Json(DataResponse {
        data: DownloadLink {
            url,
            file_name: file.file_name,
            expires_in: state.config.storage.presign_secs,
        },
    }))
}

/// GET /api/v1/files/purchased
pub async fn purchased(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let files = PurchasedFileRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: files }))
}
