//! Repository for the `courses` table.

use eduportal_core::types::DbId;
use sqlx::PgPool;

use crate::models::course::{Course, CreateCourse, UpdateCourse};

const COLUMNS: &str = "id, title, slug, summary, description, thumbnail_url, pricing_model, \
                       price_paise, sale_price_paise, currency, status, category_id, \
                       created_at, updated_at";

/// Same columns qualified with the `c` alias, for joins.
const C_COLUMNS: &str = "c.id, c.title, c.slug, c.summary, c.description, c.thumbnail_url, \
                         c.pricing_model, c.price_paise, c.sale_price_paise, c.currency, \
                         c.status, c.category_id, c.created_at, c.updated_at";

/// Provides CRUD operations for courses.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a course. `slug` is already resolved; absent enum fields fall
    /// back to the column defaults.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCourse,
        slug: &str,
    ) -> Result<Course, sqlx::Error> {
        let query = format!(
            "INSERT INTO courses \
                (title, slug, summary, description, thumbnail_url, pricing_model, \
                 price_paise, sale_price_paise, currency, status, category_id) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'free'), COALESCE($7, 0), $8, \
                     COALESCE($9, 'INR'), COALESCE($10, 'draft'), $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.summary)
            .bind(&input.description)
            .bind(&input.thumbnail_url)
            .bind(&input.pricing_model)
            .bind(input.price_paise)
            .bind(input.sale_price_paise)
            .bind(&input.currency)
            .bind(&input.status)
            .bind(input.category_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE slug = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List courses, newest first.
    ///
    /// `published_only` hides drafts and archived courses from the public
    /// catalogue; `category` filters by category slug.
    pub async fn list(
        pool: &PgPool,
        published_only: bool,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS} FROM courses c \
             LEFT JOIN categories cat ON cat.id = c.category_id \
             WHERE ($1 = false OR c.status = 'published') \
               AND ($2::TEXT IS NULL OR cat.slug = $2) \
             ORDER BY c.created_at DESC, c.id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(published_only)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a course. Only non-`None` fields are applied. Switching the
    /// pricing model to `free` also clears the sale price.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCourse,
        slug: Option<&str>,
    ) -> Result<Option<Course>, sqlx::Error> {
        let query = format!(
            "UPDATE courses SET \
                title = COALESCE($2, title), \
                slug = COALESCE($3, slug), \
                summary = COALESCE($4, summary), \
                description = COALESCE($5, description), \
                thumbnail_url = COALESCE($6, thumbnail_url), \
                pricing_model = COALESCE($7, pricing_model), \
                price_paise = COALESCE($8, price_paise), \
                sale_price_paise = CASE WHEN $7 = 'free' THEN NULL \
                                        ELSE COALESCE($9, sale_price_paise) END, \
                currency = COALESCE($10, currency), \
                status = COALESCE($11, status), \
                category_id = COALESCE($12, category_id) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.summary)
            .bind(&input.description)
            .bind(&input.thumbnail_url)
            .bind(&input.pricing_model)
            .bind(input.price_paise)
            .bind(input.sale_price_paise)
            .bind(&input.currency)
            .bind(&input.status)
            .bind(input.category_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a course with its topics, lessons, enrollments and payments.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
