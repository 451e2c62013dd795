//! Repositories for `forms`, `form_fields` and `form_submissions`.

use eduportal_core::status::PaymentStatus;
use eduportal_core::types::DbId;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::form::{
    CreateForm, CreateFormField, Form, FormField, FormSubmission, FormWithFields, UpdateForm,
};

const COLUMNS: &str = "id, title, slug, description, is_active, fee_paise, currency, \
                       created_at, updated_at";

const FIELD_COLUMNS: &str = "id, form_id, name, label, field_type, is_required, options, sort_order";

pub(crate) const SUBMISSION_COLUMNS: &str =
    "id, form_id, user_id, data, status, created_at, updated_at";

/// Provides CRUD operations for forms and their fields.
pub struct FormRepo;

impl FormRepo {
    /// Insert a form and its fields in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateForm,
        slug: &str,
    ) -> Result<FormWithFields, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO forms (title, slug, description, is_active, fee_paise, currency) \
             VALUES ($1, $2, $3, COALESCE($4, true), COALESCE($5, 0), COALESCE($6, 'INR')) \
             RETURNING {COLUMNS}"
        );
        let form = sqlx::query_as::<_, Form>(&query)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(input.is_active)
            .bind(input.fee_paise)
            .bind(&input.currency)
            .fetch_one(&mut *tx)
            .await?;

        let fields = insert_fields(&mut tx, form.id, &input.fields).await?;

        tx.commit().await?;
        Ok(FormWithFields { form, fields })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Form>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forms WHERE id = $1");
        sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Form>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forms WHERE slug = $1");
        sqlx::query_as::<_, Form>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Form>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forms ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Form>(&query).fetch_all(pool).await
    }

    /// Fields of a form in display order.
    pub async fn fields_for(pool: &PgPool, form_id: DbId) -> Result<Vec<FormField>, sqlx::Error> {
        let query = format!(
            "SELECT {FIELD_COLUMNS} FROM form_fields WHERE form_id = $1 ORDER BY sort_order"
        );
        sqlx::query_as::<_, FormField>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }

    /// Update a form. When `input.fields` is present the field list is
    /// replaced wholesale within the same transaction.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateForm,
        slug: Option<&str>,
    ) -> Result<Option<FormWithFields>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE forms SET \
                title = COALESCE($2, title), \
                slug = COALESCE($3, slug), \
                description = COALESCE($4, description), \
                is_active = COALESCE($5, is_active), \
                fee_paise = COALESCE($6, fee_paise) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let Some(form) = sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.description)
            .bind(input.is_active)
            .bind(input.fee_paise)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let fields = match &input.fields {
            Some(new_fields) => {
                sqlx::query("DELETE FROM form_fields WHERE form_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_fields(&mut tx, id, new_fields).await?
            }
            None => {
                let query = format!(
                    "SELECT {FIELD_COLUMNS} FROM form_fields WHERE form_id = $1 ORDER BY sort_order"
                );
                sqlx::query_as::<_, FormField>(&query)
                    .bind(id)
                    .fetch_all(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(Some(FormWithFields { form, fields }))
    }

    /// Delete a form with its fields, submissions and payments.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_fields(
    tx: &mut Transaction<'_, Postgres>,
    form_id: DbId,
    fields: &[CreateFormField],
) -> Result<Vec<FormField>, sqlx::Error> {
    let query = format!(
        "INSERT INTO form_fields \
            (form_id, name, label, field_type, is_required, options, sort_order) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {FIELD_COLUMNS}"
    );

    let mut inserted = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let row = sqlx::query_as::<_, FormField>(&query)
            .bind(form_id)
            .bind(&field.name)
            .bind(&field.label)
            .bind(&field.field_type)
            .bind(field.is_required.unwrap_or(false))
            .bind(Json(field.options.clone().unwrap_or_default()))
            .bind(index as i32)
            .fetch_one(&mut **tx)
            .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

/// Provides operations for form submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Insert a submission with the given status.
    pub async fn create(
        pool: &PgPool,
        form_id: DbId,
        user_id: Option<DbId>,
        data: &Value,
        status: PaymentStatus,
    ) -> Result<FormSubmission, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_submissions (form_id, user_id, data, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SUBMISSION_COLUMNS}"
        );
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(form_id)
            .bind(user_id)
            .bind(data)
            .bind(status.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FormSubmission>, sqlx::Error> {
        let query = format!("SELECT {SUBMISSION_COLUMNS} FROM form_submissions WHERE id = $1");
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Submissions of a form, newest first.
    pub async fn list_by_form(
        pool: &PgPool,
        form_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FormSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM form_submissions \
             WHERE form_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(form_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
