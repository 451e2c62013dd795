//! Repository for the `course_topics` table.
//!
//! Topics are ordered children of a course. Every write that touches
//! `sort_order` locks the parent course row first so concurrent appends,
//! deletes and reorders on the same course serialize.

use eduportal_core::error::CoreError;
use eduportal_core::ordering::{next_order, order_assignments, validate_permutation};
use eduportal_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbError;
use crate::models::topic::{CourseTopic, CreateTopic, UpdateTopic};

const COLUMNS: &str = "id, course_id, title, description, sort_order, created_at, updated_at";

/// Provides ordered CRUD operations for course topics.
pub struct TopicRepo;

impl TopicRepo {
    /// All topics of a course in display order.
    pub async fn list_by_course(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<CourseTopic>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM course_topics WHERE course_id = $1 ORDER BY sort_order"
        );
        sqlx::query_as::<_, CourseTopic>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CourseTopic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM course_topics WHERE id = $1");
        sqlx::query_as::<_, CourseTopic>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Append a topic after the course's current last topic.
    pub async fn create(
        pool: &PgPool,
        course_id: DbId,
        input: &CreateTopic,
    ) -> Result<CourseTopic, DbError> {
        let mut tx = pool.begin().await?;
        lock_course(&mut tx, course_id).await?;

        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(sort_order) FROM course_topics WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&mut *tx)
                .await?;

        let query = format!(
            "INSERT INTO course_topics (course_id, title, description, sort_order) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let topic = sqlx::query_as::<_, CourseTopic>(&query)
            .bind(course_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(next_order(max))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(topic)
    }

    /// Update title/description. Order is only changed through [`Self::reorder`].
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTopic,
    ) -> Result<Option<CourseTopic>, sqlx::Error> {
        let query = format!(
            "UPDATE course_topics SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CourseTopic>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a topic (and its lessons) and close the gap in its siblings'
    /// order keys. Returns `false` if the topic does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let course_id: Option<DbId> =
            sqlx::query_scalar("SELECT course_id FROM course_topics WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(course_id) = course_id else {
            return Ok(false);
        };
        sqlx::query("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        let removed: Option<i32> = sqlx::query_scalar(
            "DELETE FROM course_topics WHERE id = $1 RETURNING sort_order",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(removed) = removed else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE course_topics SET sort_order = sort_order - 1 \
             WHERE course_id = $1 AND sort_order > $2",
        )
        .bind(course_id)
        .bind(removed)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Apply a new order. `ids` must be a permutation of the course's topic
    /// ids; the index of each id becomes its order key.
    pub async fn reorder(
        pool: &PgPool,
        course_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<CourseTopic>, DbError> {
        let mut tx = pool.begin().await?;
        lock_course(&mut tx, course_id).await?;

        let existing: Vec<DbId> =
            sqlx::query_scalar("SELECT id FROM course_topics WHERE course_id = $1")
                .bind(course_id)
                .fetch_all(&mut *tx)
                .await?;
        validate_permutation(&existing, ids)?;

        let (topic_ids, orders): (Vec<DbId>, Vec<i32>) =
            order_assignments(ids).into_iter().unzip();
        sqlx::query(
            "UPDATE course_topics AS t SET sort_order = v.sort_order \
             FROM UNNEST($1::BIGINT[], $2::INTEGER[]) AS v(id, sort_order) \
             WHERE t.id = v.id AND t.course_id = $3",
        )
        .bind(&topic_ids)
        .bind(&orders)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM course_topics WHERE course_id = $1 ORDER BY sort_order"
        );
        let topics = sqlx::query_as::<_, CourseTopic>(&query)
            .bind(course_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(topics)
    }
}

/// Lock the parent course row, failing with `NotFound` if it does not exist.
async fn lock_course(tx: &mut Transaction<'_, Postgres>, course_id: DbId) -> Result<(), DbError> {
    let found: Option<DbId> = sqlx::query_scalar("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
        .bind(course_id)
        .fetch_optional(&mut **tx)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        }
        .into()),
    }
}
