//! Downloadable file catalogue and purchase grants.

use eduportal_core::types::{DbId, MinorUnits, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `downloadable_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DownloadableFile {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub object_key: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub is_free: bool,
    pub price_paise: MinorUnits,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload assembled from a multipart upload after the object is stored.
#[derive(Debug, Clone, Validate)]
pub struct NewDownloadableFile {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub slug: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub object_key: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub is_free: bool,
    #[validate(range(min = 0))]
    pub price_paise: MinorUnits,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDownloadableFile {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub is_free: Option<bool>,
    #[validate(range(min = 0))]
    pub price_paise: Option<MinorUnits>,
}

/// A row from the `purchased_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchasedFile {
    pub id: DbId,
    pub user_id: DbId,
    pub file_id: DbId,
    pub file_payment_id: Option<DbId>,
    pub purchased_at: Timestamp,
}

/// A purchase joined with its file, for "my downloads" listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchasedFileWithFile {
    pub id: DbId,
    pub file_id: DbId,
    pub title: String,
    pub slug: String,
    pub file_name: String,
    pub purchased_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PurchaseFileRequest {
    pub file_id: DbId,
}
