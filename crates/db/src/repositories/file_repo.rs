//! Repositories for `downloadable_files` and `purchased_files`.

use eduportal_core::types::DbId;
use sqlx::PgPool;

use crate::models::file::{
    DownloadableFile, NewDownloadableFile, PurchasedFile, PurchasedFileWithFile,
    UpdateDownloadableFile,
};

const COLUMNS: &str = "id, title, slug, description, object_key, file_name, content_type, \
                       size_bytes, is_free, price_paise, currency, created_at, updated_at";

pub(crate) const PURCHASE_COLUMNS: &str = "id, user_id, file_id, file_payment_id, purchased_at";

/// Provides CRUD operations for the downloadable file catalogue.
pub struct FileRepo;

impl FileRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewDownloadableFile,
    ) -> Result<DownloadableFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO downloadable_files \
                (title, slug, description, object_key, file_name, content_type, size_bytes, \
                 is_free, price_paise, currency) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DownloadableFile>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(&input.object_key)
            .bind(&input.file_name)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(input.is_free)
            .bind(input.price_paise)
            .bind(&input.currency)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DownloadableFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM downloadable_files WHERE id = $1");
        sqlx::query_as::<_, DownloadableFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<DownloadableFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM downloadable_files WHERE slug = $1");
        sqlx::query_as::<_, DownloadableFile>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DownloadableFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM downloadable_files \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, DownloadableFile>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update catalogue metadata. The stored object is immutable.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDownloadableFile,
        slug: Option<&str>,
    ) -> Result<Option<DownloadableFile>, sqlx::Error> {
        let query = format!(
            "UPDATE downloadable_files SET \
                title = COALESCE($2, title), \
                slug = COALESCE($3, slug), \
                description = COALESCE($4, description), \
                is_free = COALESCE($5, is_free), \
                price_paise = COALESCE($6, price_paise) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DownloadableFile>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(input.is_free)
            .bind(input.price_paise)
            .fetch_optional(pool)
            .await
    }

    /// Delete a file row, returning it so the caller can remove the object.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DownloadableFile>, sqlx::Error> {
        let query = format!("DELETE FROM downloadable_files WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, DownloadableFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

/// Provides read and grant operations for file purchases.
pub struct PurchasedFileRepo;

impl PurchasedFileRepo {
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
    ) -> Result<Option<PurchasedFile>, sqlx::Error> {
        let query = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchased_files WHERE user_id = $1 AND file_id = $2"
        );
        sqlx::query_as::<_, PurchasedFile>(&query)
            .bind(user_id)
            .bind(file_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a purchase of a free file. Concurrent calls converge on one row.
    pub async fn grant_free(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
    ) -> Result<PurchasedFile, sqlx::Error> {
        sqlx::query(
            "INSERT INTO purchased_files (user_id, file_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, file_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(file_id)
        .execute(pool)
        .await?;

        let query = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchased_files WHERE user_id = $1 AND file_id = $2"
        );
        sqlx::query_as::<_, PurchasedFile>(&query)
            .bind(user_id)
            .bind(file_id)
            .fetch_one(pool)
            .await
    }

    /// A user's purchased files, most recent first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PurchasedFileWithFile>, sqlx::Error> {
        sqlx::query_as::<_, PurchasedFileWithFile>(
            "SELECT p.id, p.file_id, f.title, f.slug, f.file_name, p.purchased_at \
             FROM purchased_files p \
             JOIN downloadable_files f ON f.id = p.file_id \
             WHERE p.user_id = $1 \
             ORDER BY p.purchased_at DESC, p.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
