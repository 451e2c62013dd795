//! Handlers for course topics.
//!
//! Topics are ordered within a course; new topics go last, deletes close the
//! gap, and a reorder must name every topic of the course exactly once.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::types::DbId;
use eduportal_db::models::topic::{CreateTopic, ReorderRequest, UpdateTopic};
use eduportal_db::repositories::{CourseRepo, TopicRepo};

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/courses/{course_id}/topics
pub async fn list_by_course(
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    CourseRepo::find_by_id(&state.pool, course_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        }))?;

    let topics = TopicRepo::list_by_course(&state.pool, course_id).await?;
    Ok(Json(DataResponse { data: topics }))
}

/// POST /api/v1/courses/{course_id}/topics
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(course_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreateTopic>,
) -> AppResult<impl IntoResponse> {
    let topic = TopicRepo::create(&state.pool, course_id, &input).await?;

    tracing::info!(
        topic_id = topic.id,
        course_id,
        order = topic.sort_order,
        user_id = admin.user_id,
        "Topic created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: topic })))
}

/// PUT /api/v1/courses/{course_id}/topics/reorder
///
/// Body `{ "ids": [...] }` lists every topic id of the course in the new
/// order. Returns the topics in that order.
pub async fn reorder(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(course_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    let topics = TopicRepo::reorder(&state.pool, course_id, &input.ids).await?;

    tracing::info!(
        course_id,
        count = topics.len(),
        user_id = admin.user_id,
        "Topics reordered",
    );

    Ok(Json(DataResponse { data: topics }))
}

/// PUT /api/v1/topics/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateTopic>,
) -> AppResult<impl IntoResponse> {
    let topic = TopicRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Topic", id }))?;
    Ok(Json(DataResponse { data: topic }))
}

/// DELETE /api/v1/topics/{id}
///
/// Removes the topic with its lessons and shifts later topics up by one.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TopicRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Topic", id }));
    }
    tracing::info!(topic_id = id, user_id = admin.user_id, "Topic deleted");
    Ok(StatusCode::NO_CONTENT)
}
