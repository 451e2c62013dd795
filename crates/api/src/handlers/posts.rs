//! Handlers for the `/posts` resource.
//!
//! Anonymous readers and regular users only see published posts; admins see
//! drafts too.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::slug::resolve_slug;
use eduportal_core::types::DbId;
use eduportal_db::models::post::{CreatePost, PostListParams, UpdatePost};
use eduportal_db::repositories::{PostFilter, PostRepo};

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/posts?category=&tag=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(params): Query<PostListParams>,
) -> AppResult<impl IntoResponse> {
    let is_admin = viewer.as_ref().is_some_and(|u| u.is_admin());
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let filter = PostFilter {
        published_only: !is_admin,
        category_slug: params.category.as_deref(),
        tag_slug: params.tag.as_deref(),
    };
    let posts = PostRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse { data: posts }))
}

/// GET /api/v1/posts/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let is_admin = viewer.as_ref().is_some_and(|u| u.is_admin());

    let post = PostRepo::find_detail_by_slug(&state.pool, &slug)
        .await?
        .filter(|detail| is_admin || detail.post.is_published)
        .ok_or(AppError::Core(CoreError::NotFoundBySlug {
            entity: "Post",
            slug,
        }))?;
    Ok(Json(DataResponse { data: post }))
}

/// POST /api/v1/posts
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(input): ValidatedJson<CreatePost>,
) -> AppResult<impl IntoResponse> {
    let slug = resolve_slug(input.slug.as_deref(), &input.title)?;
    let post = PostRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(
        post_id = post.post.id,
        user_id = admin.user_id,
        published = post.post.is_published,
        "Post created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: post })))
}

/// PUT /api/v1/posts/{id}
///
/// Supplying `author_ids` or `tag_ids` replaces the whole set.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdatePost>,
) -> AppResult<impl IntoResponse> {
    let slug = input
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), ""))
        .transpose()?;

    let post = PostRepo::update(&state.pool, id, &input, slug.as_deref())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Post", id }))?;
    Ok(Json(DataResponse { data: post }))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !PostRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Post", id }));
    }
    tracing::info!(post_id = id, user_id = admin.user_id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}
