//! Handlers for topic lessons.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::types::DbId;
use eduportal_db::models::lesson::{CreateLesson, LessonView, UpdateLesson};
use eduportal_db::models::topic::ReorderRequest;
use eduportal_db::repositories::{CourseRepo, LessonRepo, TopicRepo};

use super::courses::has_course_access;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/topics/{topic_id}/lessons
///
/// Full lesson rows for the admin editor.
pub async fn list_by_topic(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(topic_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    TopicRepo::find_by_id(&state.pool, topic_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Topic",
            id: topic_id,
        }))?;

    let lessons = LessonRepo::list_by_topic(&state.pool, topic_id).await?;
    Ok(Json(DataResponse { data: lessons }))
}

/// GET /api/v1/lessons/{id}
///
/// Content is withheld unless the lesson is a preview or the caller is
/// enrolled in (or administers) the course. Lessons of unpublished courses
/// are hidden from non-admins.
pub async fn get_lesson(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let not_found = || AppError::Core(CoreError::NotFound { entity: "Lesson", id });

    let lesson = LessonRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    let course_id = LessonRepo::course_id_for_lesson(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;

    if !auth.is_admin() {
        let published = CourseRepo::find_by_id(&state.pool, course_id)
            .await?
            .is_some_and(|c| c.is_published());
        if !published {
            return Err(not_found());
        }
    }

    let has_access = has_course_access(&state, Some(&auth), course_id).await?;
    Ok(Json(DataResponse {
        data: LessonView::new(lesson, has_access),
    }))
}

/// POST /api/v1/topics/{topic_id}/lessons
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(topic_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreateLesson>,
) -> AppResult<impl IntoResponse> {
    let lesson = LessonRepo::create(&state.pool, topic_id, &input).await?;

    tracing::info!(
        lesson_id = lesson.id,
        topic_id,
        order = lesson.sort_order,
        user_id = admin.user_id,
        "Lesson created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: lesson })))
}

/// PUT /api/v1/topics/{topic_id}/lessons/reorder
pub async fn reorder(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(topic_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    let lessons = LessonRepo::reorder(&state.pool, topic_id, &input.ids).await?;

    tracing::info!(
        topic_id,
        count = lessons.len(),
        user_id = admin.user_id,
        "Lessons reordered",
    );

    Ok(Json(DataResponse { data: lessons }))
}

/// PUT /api/v1/lessons/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateLesson>,
) -> AppResult<impl IntoResponse> {
    let lesson = LessonRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Lesson", id }))?;
    Ok(Json(DataResponse { data: lesson }))
}

/// DELETE /api/v1/lessons/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !LessonRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Lesson", id }));
    }
    tracing::info!(lesson_id = id, user_id = admin.user_id, "Lesson deleted");
    Ok(StatusCode::NO_CONTENT)
}
