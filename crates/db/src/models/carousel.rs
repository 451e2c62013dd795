//! Home-page carousel items.

use eduportal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `carousel_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CarouselItem {
    pub id: DbId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(skip_serializing)]
    pub image_key: Option<String>,
    pub link_url: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload assembled from a multipart upload after the image is stored.
#[derive(Debug, Clone, Validate)]
pub struct NewCarouselItem {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 500))]
    pub subtitle: Option<String>,
    pub image_url: String,
    pub image_key: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCarouselItem {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub subtitle: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    pub is_active: Option<bool>,
}
