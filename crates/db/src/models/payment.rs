//! Payment rows for the three purchasable asset kinds.
//!
//! All three tables share the provider columns and the
//! `pending -> success | failed` status lifecycle.

use eduportal_core::error::CoreError;
use eduportal_core::status::PaymentStatus;
use eduportal_core::types::{DbId, MinorUnits, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `payments` table (course purchases).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CoursePayment {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    #[serde(skip_serializing)]
    pub provider_signature: Option<String>,
    pub amount_paise: MinorUnits,
    pub currency: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `file_payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FilePayment {
    pub id: DbId,
    pub user_id: DbId,
    pub file_id: DbId,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    #[serde(skip_serializing)]
    pub provider_signature: Option<String>,
    pub amount_paise: MinorUnits,
    pub currency: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `form_payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormPayment {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub form_id: DbId,
    pub submission_id: DbId,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    #[serde(skip_serializing)]
    pub provider_signature: Option<String>,
    pub amount_paise: MinorUnits,
    pub currency: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

macro_rules! impl_payment_status {
    ($($ty:ty),+) => {
        $(
            impl $ty {
                pub fn payment_status(&self) -> Result<PaymentStatus, CoreError> {
                    self.status.parse()
                }
            }
        )+
    };
}

impl_payment_status!(CoursePayment, FilePayment, FormPayment);

/// Fields needed to record a freshly created gateway order.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: Option<DbId>,
    pub provider_order_id: String,
    pub amount_paise: MinorUnits,
    pub currency: String,
}

/// Checkout result posted back by the client after the gateway's widget
/// completes.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, max = 100))]
    pub order_id: String,
    #[validate(length(min = 1, max = 100))]
    pub payment_id: String,
    #[validate(length(min = 1, max = 200))]
    pub signature: String,
}
