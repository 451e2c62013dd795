//! Course enrollment model.

use eduportal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `enrollments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub payment_id: Option<DbId>,
    pub enrolled_at: Timestamp,
}

/// An enrollment joined with the course it grants, for "my courses" listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EnrollmentWithCourse {
    pub id: DbId,
    pub course_id: DbId,
    pub course_title: String,
    pub course_slug: String,
    pub thumbnail_url: Option<String>,
    pub enrolled_at: Timestamp,
}
