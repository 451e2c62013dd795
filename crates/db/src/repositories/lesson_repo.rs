//! Repository for the `course_lessons` table.
//!
//! Lessons are ordered children of a topic. Writes that touch `sort_order`
//! lock the parent topic row first.

use eduportal_core::error::CoreError;
use eduportal_core::ordering::{next_order, order_assignments, validate_permutation};
use eduportal_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbError;
use crate::models::lesson::{CourseLesson, CreateLesson, UpdateLesson};

const COLUMNS: &str = "id, topic_id, title, content, video_url, duration_secs, is_preview, \
                       sort_order, created_at, updated_at";

/// Provides ordered CRUD operations for topic lessons.
pub struct LessonRepo;

impl LessonRepo {
    /// All lessons of a topic in display order.
    pub async fn list_by_topic(
        pool: &PgPool,
        topic_id: DbId,
    ) -> Result<Vec<CourseLesson>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_lessons WHERE topic_id = $1 ORDER BY sort_order"
        );
        sqlx::query_as::<_, CourseLesson>(&query)
            .bind(topic_id)
            .fetch_all(pool)
            .await
    }

    /// Every lesson of a course, ordered by topic order then lesson order.
    pub async fn list_by_course(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<CourseLesson>, sqlx::Error> {
        sqlx::query_as::<_, CourseLesson>(
            "SELECT l.id, l.topic_id, l.title, l.content, l.video_url, l.duration_secs, \
                    l.is_preview, l.sort_order, l.created_at, l.updated_at \
             FROM course_lessons l \
             JOIN course_topics t ON t.id = l.topic_id \
             WHERE t.course_id = $1 \
             ORDER BY t.sort_order, l.sort_order",
        )
        .bind(course_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CourseLesson>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM course_lessons WHERE id = $1");
        sqlx::query_as::<_, CourseLesson>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The course a lesson belongs to, through its topic.
    pub async fn course_id_for_lesson(
        pool: &PgPool,
        lesson_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT t.course_id FROM course_lessons l \
             JOIN course_topics t ON t.id = l.topic_id \
             WHERE l.id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
    }

    /// Append a lesson after the topic's current last lesson.
    pub async fn create(
        pool: &PgPool,
        topic_id: DbId,
        input: &CreateLesson,
    ) -> Result<CourseLesson, DbError> {
        let mut tx = pool.begin().await?;
        lock_topic(&mut tx, topic_id).await?;

        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(sort_order) FROM course_lessons WHERE topic_id = $1")
                .bind(topic_id)
                .fetch_one(&mut *tx)
                .await?;

        let query = format!(
            "INSERT INTO course_lessons \
                (topic_id, title, content, video_url, duration_secs, is_preview, sort_order) \
             VALUES ($1, $2, COALESCE($3, ''), $4, $5, COALESCE($6, false), $7) \
             RETURNING {COLUMNS}"
        );
        let lesson = sqlx::query_as::<_, CourseLesson>(&query)
            .bind(topic_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.video_url)
            .bind(input.duration_secs)
            .bind(input.is_preview)
            .bind(next_order(max))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(lesson)
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLesson,
    ) -> Result<Option<CourseLesson>, sqlx::Error> {
        let query = format!(
            "UPDATE course_lessons SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                video_url = COALESCE($4, video_url), \
                duration_secs = COALESCE($5, duration_secs), \
                is_preview = COALESCE($6, is_preview) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseLesson>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.video_url)
            .bind(input.duration_secs)
            .bind(input.is_preview)
            .fetch_optional(pool)
            .await
    }

    /// Delete a lesson and close the gap in its siblings' order keys.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let topic_id: Option<DbId> =
            sqlx::query_scalar("SELECT topic_id FROM course_lessons WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(topic_id) = topic_id else {
            return Ok(false);
        };
        sqlx::query("SELECT id FROM course_topics WHERE id = $1 FOR UPDATE")
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;

        let removed: Option<i32> = sqlx::query_scalar(
            "DELETE FROM course_lessons WHERE id = $1 RETURNING sort_order",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(removed) = removed else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE course_lessons SET sort_order = sort_order - 1 \
             WHERE topic_id = $1 AND sort_order > $2",
        )
        .bind(topic_id)
        .bind(removed)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Apply a new lesson order within a topic.
    pub async fn reorder(
        pool: &PgPool,
        topic_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<CourseLesson>, DbError> {
        let mut tx = pool.begin().await?;
        lock_topic(&mut tx, topic_id).await?;

        let existing: Vec<DbId> =
            sqlx::query_scalar("SELECT id FROM course_lessons WHERE topic_id = $1")
                .bind(topic_id)
                .fetch_all(&mut *tx)
                .await?;
        validate_permutation(&existing, ids)?;

        let (lesson_ids, orders): (Vec<DbId>, Vec<i32>) =
            order_assignments(ids).into_iter().unzip();
        sqlx::query(
            "UPDATE course_lessons AS l SET sort_order = v.sort_order \
             FROM UNNEST($1::BIGINT[], $2::INTEGER[]) AS v(id, sort_order) \
             WHERE l.id = v.id AND l.topic_id = $3",
        )
        .bind(&lesson_ids)
        .bind(&orders)
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM course_lessons WHERE topic_id = $1 ORDER BY sort_order"
        );
        let lessons = sqlx::query_as::<_, CourseLesson>(&query)
            .bind(topic_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(lessons)
    }
}

async fn lock_topic(tx: &mut Transaction<'_, Postgres>, topic_id: DbId) -> Result<(), DbError> {
    let found: Option<DbId> =
        sqlx::query_scalar("SELECT id FROM course_topics WHERE id = $1 FOR UPDATE")
            .bind(topic_id)
            .fetch_optional(&mut **tx)
            .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound {
            entity: "Topic",
            id: topic_id,
        }
        .into()),
    }
}
