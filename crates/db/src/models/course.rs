//! Course entity model and DTOs.

use eduportal_core::error::CoreError;
use eduportal_core::payment::effective_price;
use eduportal_core::status::{CourseStatus, PricingModel};
use eduportal_core::types::{DbId, MinorUnits, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub pricing_model: String,
    pub price_paise: MinorUnits,
    pub sale_price_paise: Option<MinorUnits>,
    pub currency: String,
    pub status: String,
    pub category_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Course {
    pub fn pricing(&self) -> Result<PricingModel, CoreError> {
        self.pricing_model.parse()
    }

    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published.as_str()
    }

    /// Amount a buyer pays right now (0 for free courses).
    pub fn price_to_pay(&self) -> Result<MinorUnits, CoreError> {
        Ok(effective_price(
            self.pricing()?,
            self.price_paise,
            self.sale_price_paise,
        ))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourse {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    pub pricing_model: Option<String>,
    #[validate(range(min = 0))]
    pub price_paise: Option<MinorUnits>,
    #[validate(range(min = 0))]
    pub sale_price_paise: Option<MinorUnits>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<DbId>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    pub pricing_model: Option<String>,
    #[validate(range(min = 0))]
    pub price_paise: Option<MinorUnits>,
    #[validate(range(min = 0))]
    pub sale_price_paise: Option<MinorUnits>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<DbId>,
}

/// Query parameters for `GET /courses`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseListParams {
    /// Category slug filter.
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
