//! Dynamic forms, their fields and submissions.

use eduportal_core::error::CoreError;
use eduportal_core::forms::FieldSpec;
use eduportal_core::types::{DbId, MinorUnits, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Form {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub fee_paise: MinorUnits,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `form_fields` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormField {
    pub id: DbId,
    pub form_id: DbId,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub is_required: bool,
    pub options: Json<Vec<String>>,
    #[serde(rename = "order")]
    pub sort_order: i32,
}

impl FormField {
    pub fn spec(&self) -> Result<FieldSpec, CoreError> {
        Ok(FieldSpec {
            name: self.name.clone(),
            label: self.label.clone(),
            field_type: self.field_type.parse()?,
            is_required: self.is_required,
            options: self.options.0.clone(),
        })
    }
}

/// A form with its fields in display order.
#[derive(Debug, Clone, Serialize)]
pub struct FormWithFields {
    #[serde(flatten)]
    pub form: Form,
    pub fields: Vec<FormField>,
}

/// A row from the `form_submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormSubmission {
    pub id: DbId,
    pub form_id: DbId,
    pub user_id: Option<DbId>,
    pub data: Value,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFormField {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub label: String,
    pub field_type: String,
    pub is_required: Option<bool>,
    pub options: Option<Vec<String>>,
}

impl CreateFormField {
    pub fn spec(&self) -> Result<FieldSpec, CoreError> {
        Ok(FieldSpec {
            name: self.name.clone(),
            label: self.label.clone(),
            field_type: self.field_type.parse()?,
            is_required: self.is_required.unwrap_or(false),
            options: self.options.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateForm {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0))]
    pub fee_paise: Option<MinorUnits>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<CreateFormField>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateForm {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0))]
    pub fee_paise: Option<MinorUnits>,
    /// When present, replaces every field of the form.
    #[validate(nested)]
    pub fields: Option<Vec<CreateFormField>>,
}

/// Public submission payload: values keyed by field name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitForm {
    pub data: Map<String, Value>,
}
