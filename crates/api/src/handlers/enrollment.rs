//! Course purchase and enrollment handlers.
//!
//! Only published courses can be bought; the flow itself lives in
//! [`super::checkout`].

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::types::DbId;
use eduportal_db::models::enrollment::Enrollment;
use eduportal_db::repositories::{CourseRepo, EnrollmentRepo};
use serde::Serialize;

use super::checkout::{self, CourseLedger};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Enrollment state of the caller for one course.
#[derive(Debug, Serialize)]
pub struct EnrollmentStatus {
    pub course_id: DbId,
    pub enrolled: bool,
    pub enrollment: Option<Enrollment>,
}

/// POST /api/v1/courses/{id}/purchase
pub async fn purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let course = CourseRepo::find_by_id(&state.pool, course_id)
        .await?
        .filter(|c| c.is_published())
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        }))?;

    let amount = course.price_to_pay()?;
    let (status, response) = checkout::purchase::<CourseLedger>(
        &state,
        auth.user_id,
        course_id,
        amount,
        &course.currency,
    )
    .await?;
    Ok((status, Json(DataResponse { data: response })))
}

/// GET /api/v1/courses/{id}/enrollment
pub async fn enrollment_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    CourseRepo::find_by_id(&state.pool, course_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        }))?;

    let enrollment = EnrollmentRepo::find(&state.pool, auth.user_id, course_id).await?;
    Ok(Json(DataResponse {
        data: EnrollmentStatus {
            course_id,
            enrolled: enrollment.is_some(),
            enrollment,
        },
    }))
}

/// GET /api/v1/me/enrollments
pub async fn my_enrollments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let enrollments = EnrollmentRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: enrollments }))
}
