//! Repositories for `payments`, `file_payments` and `form_payments`.
//!
//! Each payment row moves `pending -> success` or `pending -> failed` once.
//! Settling a payment as successful locks the row, flips the status and
//! writes the access grant (enrollment, purchased file, or submission status)
//! in the same transaction, so a verify call racing a webhook delivery grants
//! access exactly once.

use eduportal_core::status::PaymentStatus;
use eduportal_core::types::{DbId, MinorUnits};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::enrollment::Enrollment;
use crate::models::file::PurchasedFile;
use crate::models::form::FormSubmission;
use crate::models::payment::{CoursePayment, FilePayment, FormPayment, NewPayment};

/// Outcome of settling a payment as captured.
#[derive(Debug)]
pub enum Settlement<P, G> {
    /// Moved from `pending` to `success`; the grant was written alongside.
    Completed(P, G),
    /// Had already succeeded; nothing changed.
    AlreadyCompleted(P, G),
    /// Had already failed. Terminal; nothing changed.
    AlreadyFailed(P),
}

impl<P, G> Settlement<P, G> {
    pub fn payment(&self) -> &P {
        match self {
            Self::Completed(p, _) | Self::AlreadyCompleted(p, _) | Self::AlreadyFailed(p) => p,
        }
    }
}

/// Classify a locked row's status. Unparseable statuses are treated as pending
/// so the CHECK constraint remains the single source of truth.
fn locked_status(status: &str) -> PaymentStatus {
    status.parse().unwrap_or(PaymentStatus::Pending)
}

// ---------------------------------------------------------------------------
// Course payments
// ---------------------------------------------------------------------------

const COURSE_COLUMNS: &str = "id, user_id, course_id, provider_order_id, provider_payment_id, \
                              provider_signature, amount_paise, currency, status, \
                              created_at, updated_at";

/// Provides lifecycle operations for course payments.
pub struct CoursePaymentRepo;

impl CoursePaymentRepo {
    /// Record a freshly created gateway order as a pending payment.
    pub async fn create_pending(
        pool: &PgPool,
        course_id: DbId,
        input: &NewPayment,
    ) -> Result<CoursePayment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (user_id, course_id, provider_order_id, amount_paise, currency) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CoursePayment>(&query)
            .bind(input.user_id)
            .bind(course_id)
            .bind(&input.provider_order_id)
            .bind(input.amount_paise)
            .bind(&input.currency)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<CoursePayment>, sqlx::Error> {
        let query = format!("SELECT {COURSE_COLUMNS} FROM payments WHERE provider_order_id = $1");
        sqlx::query_as::<_, CoursePayment>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// The newest pending order for the same user, course and amount.
    pub async fn find_reusable_pending(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
        amount: MinorUnits,
    ) -> Result<Option<CoursePayment>, sqlx::Error> {
        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM payments \
             WHERE user_id = $1 AND course_id = $2 AND amount_paise = $3 AND status = 'pending' \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, CoursePayment>(&query)
            .bind(user_id)
            .bind(course_id)
            .bind(amount)
            .fetch_optional(pool)
            .await
    }

    /// Mark a pending payment failed. Returns `None` if the order is unknown
    /// or no longer pending.
    pub async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Option<CoursePayment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = 'failed', \
                provider_payment_id = COALESCE($2, provider_payment_id), \
                provider_signature = COALESCE($3, provider_signature) \
             WHERE provider_order_id = $1 AND status = 'pending' \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CoursePayment>(&query)
            .bind(order_id)
            .bind(payment_id)
            .bind(signature)
            .fetch_optional(pool)
            .await
    }

    /// Settle a payment as captured and enroll the buyer.
    ///
    /// Returns `None` if the order is unknown.
    pub async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<CoursePayment, Enrollment>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM payments WHERE provider_order_id = $1 FOR UPDATE"
        );
        let Some(payment) = sqlx::query_as::<_, CoursePayment>(&query)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let settlement = match locked_status(&payment.status) {
            PaymentStatus::Failed => Settlement::AlreadyFailed(payment),
            PaymentStatus::Success => {
                let grant =
                    enroll(&mut tx, payment.user_id, payment.course_id, payment.id).await?;
                Settlement::AlreadyCompleted(payment, grant)
            }
            PaymentStatus::Pending => {
                let query = format!(
                    "UPDATE payments SET status = 'success', \
                        provider_payment_id = COALESCE(NULLIF($2, ''), provider_payment_id), \
                        provider_signature = COALESCE($3, provider_signature) \
                     WHERE id = $1 \
                     RETURNING {COURSE_COLUMNS}"
                );
                let payment = sqlx::query_as::<_, CoursePayment>(&query)
                    .bind(payment.id)
                    .bind(payment_id)
                    .bind(signature)
                    .fetch_one(&mut *tx)
                    .await?;
                let grant =
                    enroll(&mut tx, payment.user_id, payment.course_id, payment.id).await?;
                Settlement::Completed(payment, grant)
            }
        };

        tx.commit().await?;
        Ok(Some(settlement))
    }
}

async fn enroll(
    tx: &mut Transaction<'_, Postgres>,
    user_id: DbId,
    course_id: DbId,
    payment_id: DbId,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query(
        "INSERT INTO enrollments (user_id, course_id, payment_id) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, course_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(payment_id)
    .execute(&mut **tx)
    .await?;

    let query = format!(
        "SELECT {} FROM enrollments WHERE user_id = $1 AND course_id = $2",
        super::enrollment_repo::COLUMNS
    );
    sqlx::query_as::<_, Enrollment>(&query)
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&mut **tx)
        .await
}

// ---------------------------------------------------------------------------
// File payments
// ---------------------------------------------------------------------------

const FILE_COLUMNS: &str = "id, user_id, file_id, provider_order_id, provider_payment_id, \
                            provider_signature, amount_paise, currency, status, \
                            created_at, updated_at";

/// Provides lifecycle operations for file payments.
pub struct FilePaymentRepo;

impl FilePaymentRepo {
    pub async fn create_pending(
        pool: &PgPool,
        file_id: DbId,
        input: &NewPayment,
    ) -> Result<FilePayment, sqlx::Error> {
        let query = format!(
            "INSERT INTO file_payments (user_id, file_id, provider_order_id, amount_paise, currency) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, FilePayment>(&query)
            .bind(input.user_id)
            .bind(file_id)
            .bind(&input.provider_order_id)
            .bind(input.amount_paise)
            .bind(&input.currency)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<FilePayment>, sqlx::Error> {
        let query = format!("SELECT {FILE_COLUMNS} FROM file_payments WHERE provider_order_id = $1");
        sqlx::query_as::<_, FilePayment>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_reusable_pending(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
        amount: MinorUnits,
    ) -> Result<Option<FilePayment>, sqlx::Error> {
        let query = format!(
            "SELECT {FILE_COLUMNS} FROM file_payments \
             WHERE user_id = $1 AND file_id = $2 AND amount_paise = $3 AND status = 'pending' \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, FilePayment>(&query)
            .bind(user_id)
            .bind(file_id)
            .bind(amount)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Option<FilePayment>, sqlx::Error> {
        let query = format!(
            "UPDATE file_payments SET status = 'failed', \
                provider_payment_id = COALESCE($2, provider_payment_id), \
                provider_signature = COALESCE($3, provider_signature) \
             WHERE provider_order_id = $1 AND status = 'pending' \
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, FilePayment>(&query)
            .bind(order_id)
            .bind(payment_id)
            .bind(signature)
            .fetch_optional(pool)
            .await
    }

    /// Settle a payment as captured and record the file purchase.
    pub async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<FilePayment, PurchasedFile>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {FILE_COLUMNS} FROM file_payments WHERE provider_order_id = $1 FOR UPDATE"
        );
        let Some(payment) = sqlx::query_as::<_, FilePayment>(&query)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let settlement = match locked_status(&payment.status) {
            PaymentStatus::Failed => Settlement::AlreadyFailed(payment),
            PaymentStatus::Success => {
                let grant =
                    record_purchase(&mut tx, payment.user_id, payment.file_id, payment.id).await?;
                Settlement::AlreadyCompleted(payment, grant)
            }
            PaymentStatus::Pending => {
                let query = format!(
                    "UPDATE file_payments SET status = 'success', \
                        provider_payment_id = COALESCE(NULLIF($2, ''), provider_payment_id), \
                        provider_signature = COALESCE($3, provider_signature) \
                     WHERE id = $1 \
                     RETURNING {FILE_COLUMNS}"
                );
                let payment = sqlx::query_as::<_, FilePayment>(&query)
                    .bind(payment.id)
                    .bind(payment_id)
                    .bind(signature)
                    .fetch_one(&mut *tx)
                    .await?;
                let grant =
                    record_purchase(&mut tx, payment.user_id, payment.file_id, payment.id).await?;
                Settlement::Completed(payment, grant)
            }
        };

        tx.commit().await?;
        Ok(Some(settlement))
    }
}

async fn record_purchase(
    tx: &mut Transaction<'_, Postgres>,
    user_id: DbId,
    file_id: DbId,
    file_payment_id: DbId,
) -> Result<PurchasedFile, sqlx::Error> {
    sqlx::query(
        "INSERT INTO purchased_files (user_id, file_id, file_payment_id) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, file_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(file_id)
    .bind(file_payment_id)
    .execute(&mut **tx)
    .await?;

    let query = format!(
        "SELECT {} FROM purchased_files WHERE user_id = $1 AND file_id = $2",
        super::file_repo::PURCHASE_COLUMNS
    );
    sqlx::query_as::<_, PurchasedFile>(&query)
        .bind(user_id)
        .bind(file_id)
        .fetch_one(&mut **tx)
        .await
}

// ---------------------------------------------------------------------------
// Form payments
// ---------------------------------------------------------------------------

const FORM_COLUMNS: &str = "id, user_id, form_id, submission_id, provider_order_id, \
                            provider_payment_id, provider_signature, amount_paise, currency, \
                            status, created_at, updated_at";

/// Provides lifecycle operations for form fee payments.
pub struct FormPaymentRepo;

impl FormPaymentRepo {
    /// Insert a pending submission and its pending payment together.
    pub async fn create_with_submission(
        pool: &PgPool,
        form_id: DbId,
        data: &Value,
        input: &NewPayment,
    ) -> Result<(FormSubmission, FormPayment), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO form_submissions (form_id, user_id, data, status) \
             VALUES ($1, $2, $3, 'pending') \
             RETURNING {}",
            super::form_repo::SUBMISSION_COLUMNS
        );
        let submission = sqlx::query_as::<_, FormSubmission>(&query)
            .bind(form_id)
            .bind(input.user_id)
            .bind(data)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO form_payments \
                (user_id, form_id, submission_id, provider_order_id, amount_paise, currency) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {FORM_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, FormPayment>(&query)
            .bind(input.user_id)
            .bind(form_id)
            .bind(submission.id)
            .bind(&input.provider_order_id)
            .bind(input.amount_paise)
            .bind(&input.currency)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((submission, payment))
    }

    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<FormPayment>, sqlx::Error> {
        let query = format!("SELECT {FORM_COLUMNS} FROM form_payments WHERE provider_order_id = $1");
        sqlx::query_as::<_, FormPayment>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a pending payment and its submission failed.
    pub async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Option<FormPayment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE form_payments SET status = 'failed', \
                provider_payment_id = COALESCE($2, provider_payment_id), \
                provider_signature = COALESCE($3, provider_signature) \
             WHERE provider_order_id = $1 AND status = 'pending' \
             RETURNING {FORM_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, FormPayment>(&query)
            .bind(order_id)
            .bind(payment_id)
            .bind(signature)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(payment) = &payment {
            sqlx::query("UPDATE form_submissions SET status = 'failed' WHERE id = $1")
                .bind(payment.submission_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(payment)
    }

    /// Settle a payment as captured and mark its submission successful.
    pub async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<FormPayment, FormSubmission>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {FORM_COLUMNS} FROM form_payments WHERE provider_order_id = $1 FOR UPDATE"
        );
        let Some(payment) = sqlx::query_as::<_, FormPayment>(&query)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let settlement = match locked_status(&payment.status) {
            PaymentStatus::Failed => Settlement::AlreadyFailed(payment),
            PaymentStatus::Success => {
                let submission = settle_submission(&mut tx, payment.submission_id).await?;
                Settlement::AlreadyCompleted(payment, submission)
            }
            PaymentStatus::Pending => {
                let query = format!(
                    "UPDATE form_payments SET status = 'success', \
                        provider_payment_id = COALESCE(NULLIF($2, ''), provider_payment_id), \
                        provider_signature = COALESCE($3, provider_signature) \
                     WHERE id = $1 \
                     RETURNING {FORM_COLUMNS}"
                );
                let payment = sqlx::query_as::<_, FormPayment>(&query)
                    .bind(payment.id)
                    .bind(payment_id)
                    .bind(signature)
                    .fetch_one(&mut *tx)
                    .await?;
                let submission = settle_submission(&mut tx, payment.submission_id).await?;
                Settlement::Completed(payment, submission)
            }
        };

        tx.commit().await?;
        Ok(Some(settlement))
    }
}

async fn settle_submission(
    tx: &mut Transaction<'_, Postgres>,
    submission_id: DbId,
) -> Result<FormSubmission, sqlx::Error> {
    let query = format!(
        "UPDATE form_submissions SET status = 'success' WHERE id = $1 RETURNING {}",
        super::form_repo::SUBMISSION_COLUMNS
    );
    sqlx::query_as::<_, FormSubmission>(&query)
        .bind(submission_id)
        .fetch_one(&mut **tx)
        .await
}
