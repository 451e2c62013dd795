//! Handlers for the `/carousel` resource.
//!
//! At most one item is active at a time; activating one deactivates the rest.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::types::DbId;
use eduportal_core::uploads::{content_type_for, object_key, prefixes, validate_image_name};
use eduportal_db::models::carousel::{NewCarouselItem, UpdateCarouselItem};
use eduportal_db::repositories::CarouselRepo;
use validator::Validate;

use super::multipart::MultipartForm;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/carousel
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let items = CarouselRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/carousel/active
///
/// `data` is `null` when nothing is active.
pub async fn get_active(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let item = CarouselRepo::find_active(&state.pool).await?;
    Ok(Json(DataResponse { data: item }))
}

/// POST /api/v1/carousel
///
/// Multipart: `title`, `subtitle`, `link_url`, `is_active` and an `image` file.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart, "image").await?;
    let image = form.take_file("image")?;
    validate_image_name(&image.file_name)?;

    let key = object_key(prefixes::CAROUSEL, &image.file_name);
    let mut input = NewCarouselItem {
        title: form.required_text("title")?,
        subtitle: form.text("subtitle"),
        image_url: state.storage.public_url(&key),
        image_key: Some(key.clone()),
        link_url: form.text("link_url"),
        is_active: form.flag("is_active")?.unwrap_or(false),
    };
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    state
        .storage
        .put(&key, image.bytes, content_type_for(&image.file_name))
        .await?;

    let item = match CarouselRepo::create(&state.pool, &input).await {
        Ok(item) => item,
        Err(e) => {
            remove_object(&state, input.image_key.take()).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        carousel_id = item.id,
        is_active = item.is_active,
        user_id = admin.user_id,
        "Carousel item created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// PUT /api/v1/carousel/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateCarouselItem>,
) -> AppResult<impl IntoResponse> {
    let item = CarouselRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CarouselItem",
            id,
        }))?;
    Ok(Json(DataResponse { data: item }))
}

/// POST /api/v1/carousel/{id}/activate
pub async fn activate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = CarouselRepo::activate(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CarouselItem",
            id,
        }))?;

    tracing::info!(carousel_id = id, user_id = admin.user_id, "Carousel item activated");

    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/v1/carousel/{id}
///
/// The stored image is removed after the row is gone.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let item = CarouselRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CarouselItem",
            id,
        }))?;

    remove_object(&state, item.image_key).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort object removal; a leftover object is only logged.
pub(crate) async fn remove_object(state: &AppState, key: Option<String>) {
    let Some(key) = key else { return };
    if let Err(e) = state.storage.delete(&key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete stored object");
    }
}
