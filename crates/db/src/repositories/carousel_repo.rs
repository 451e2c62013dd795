//! Repository for the `carousel_items` table.
//!
//! At most one item is active. Activating an item deactivates the others in
//! the same transaction; the partial unique index backs this up.

use eduportal_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::carousel::{CarouselItem, NewCarouselItem, UpdateCarouselItem};

const COLUMNS: &str = "id, title, subtitle, image_url, image_key, link_url, is_active, \
                       created_at, updated_at";

/// Provides CRUD and activation for carousel items.
pub struct CarouselRepo;

impl CarouselRepo {
    pub async fn create(pool: &PgPool, input: &NewCarouselItem) -> Result<CarouselItem, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if input.is_active {
            deactivate_all(&mut tx, None).await?;
        }

        let query = format!(
            "INSERT INTO carousel_items (title, subtitle, image_url, image_key, link_url, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let item = sqlx::query_as::<_, CarouselItem>(&query)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.image_url)
            .bind(&input.image_key)
            .bind(&input.link_url)
            .bind(input.is_active)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CarouselItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM carousel_items WHERE id = $1");
        sqlx::query_as::<_, CarouselItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All items, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<CarouselItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM carousel_items ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CarouselItem>(&query).fetch_all(pool).await
    }

    pub async fn find_active(pool: &PgPool) -> Result<Option<CarouselItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM carousel_items WHERE is_active");
        sqlx::query_as::<_, CarouselItem>(&query)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCarouselItem,
    ) -> Result<Option<CarouselItem>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if input.is_active == Some(true) {
            deactivate_all(&mut tx, Some(id)).await?;
        }

        let query = format!(
            "UPDATE carousel_items SET \
                title = COALESCE($2, title), \
                subtitle = COALESCE($3, subtitle), \
                link_url = COALESCE($4, link_url), \
                is_active = COALESCE($5, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let item = sqlx::query_as::<_, CarouselItem>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.link_url)
            .bind(input.is_active)
            .fetch_optional(&mut *tx)
            .await?;

        // Leave the previously active item alone if the target does not exist.
        if item.is_none() {
            return Ok(None);
        }
        tx.commit().await?;
        Ok(item)
    }

    /// Make `id` the single active item.
    pub async fn activate(pool: &PgPool, id: DbId) -> Result<Option<CarouselItem>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        deactivate_all(&mut tx, Some(id)).await?;

        let query = format!(
            "UPDATE carousel_items SET is_active = true WHERE id = $1 RETURNING {COLUMNS}"
        );
        let item = sqlx::query_as::<_, CarouselItem>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if item.is_none() {
            return Ok(None);
        }
        tx.commit().await?;
        Ok(item)
    }

    /// Delete an item, returning it so the caller can remove its image.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<CarouselItem>, sqlx::Error> {
        let query = format!("DELETE FROM carousel_items WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, CarouselItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

/// Clear the active flag on every item except `keep`.
///
/// Takes a transaction-scoped advisory lock first so concurrent activations
/// serialize instead of tripping the partial unique index.
async fn deactivate_all(
    tx: &mut Transaction<'_, Postgres>,
    keep: Option<DbId>,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('carousel_items_active'))")
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "UPDATE carousel_items SET is_active = false \
         WHERE is_active AND ($1::BIGINT IS NULL OR id <> $1)",
    )
    .bind(keep)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
