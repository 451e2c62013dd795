//! Repository for the `enrollments` table.

use eduportal_core::types::DbId;
use sqlx::PgPool;

use crate::models::enrollment::{Enrollment, EnrollmentWithCourse};

pub(crate) const COLUMNS: &str = "id, user_id, course_id, payment_id, enrolled_at";

/// Provides read and grant operations for course enrollments.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// The user's enrollment in a course, if any.
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the user is enrolled in the course.
    pub async fn exists(pool: &PgPool, user_id: DbId, course_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await
    }

    /// Enroll a user without payment. Concurrent calls converge on one row.
    pub async fn grant_free(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Enrollment, sqlx::Error> {
        sqlx::query(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(user_id)
            .bind(course_id)
            .fetch_one(pool)
            .await
    }

    /// A user's enrollments with course info, most recent first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
        sqlx::query_as::<_, EnrollmentWithCourse>(
            "SELECT e.id, e.course_id, c.title AS course_title, c.slug AS course_slug, \
                    c.thumbnail_url, e.enrolled_at \
             FROM enrollments e \
             JOIN courses c ON c.id = e.course_id \
             WHERE e.user_id = $1 \
             ORDER BY e.enrolled_at DESC, e.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
