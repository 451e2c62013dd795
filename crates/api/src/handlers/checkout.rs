//! Purchase and verification flow shared by courses, files and forms.
//!
//! Each payment table is described by a [`PaymentLedger`]; assets bought by a
//! signed-in user (courses, files) also implement [`Purchasable`]. The
//! handlers only resolve the asset and its price, then call [`purchase`] or
//! [`verify_checkout`].

use async_trait::async_trait;
use axum::http::StatusCode;
use eduportal_core::error::CoreError;
use eduportal_core::payment::{make_receipt, verify_signature};
use eduportal_core::status::PaymentStatus;
use eduportal_core::types::{DbId, MinorUnits};
use eduportal_db::models::enrollment::Enrollment;
use eduportal_db::models::file::PurchasedFile;
use eduportal_db::models::form::FormSubmission;
use eduportal_db::models::payment::{
    CoursePayment, FilePayment, FormPayment, NewPayment, VerifyPaymentRequest,
};
use eduportal_db::repositories::{
    CoursePaymentRepo, EnrollmentRepo, FilePaymentRepo, FormPaymentRepo, PurchasedFileRepo,
    Settlement,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::gateway::{GatewayOrder, OrderRequest};
use crate::state::AppState;

pub const STATUS_ENROLLED: &str = "enrolled";
pub const STATUS_PURCHASED: &str = "purchased";
pub const STATUS_SUBMITTED: &str = "submitted";
pub const STATUS_PAYMENT_REQUIRED: &str = "payment_required";

/// What the browser checkout widget needs to open a payment.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOrder {
    pub order_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub key_id: String,
}

/// Result of a purchase or verification call.
///
/// Exactly one of `grant` (access is available) and `order` (payment is
/// required) is present.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse<G: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant: Option<G>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<CheckoutOrder>,
}

impl<G: Serialize> PurchaseResponse<G> {
    pub fn granted(status: &'static str, grant: G) -> Self {
        Self {
            status,
            grant: Some(grant),
            order: None,
        }
    }

    pub fn payment_required(order: CheckoutOrder) -> Self {
        Self {
            status: STATUS_PAYMENT_REQUIRED,
            grant: None,
            order: Some(order),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledgers
// ---------------------------------------------------------------------------

/// One payment table and the access grant its successful rows unlock.
#[async_trait]
pub trait PaymentLedger {
    type Payment: Send + Sync;
    type Grant: Serialize + Send;

    /// Receipt prefix and log label.
    const KIND: &'static str;
    /// Response status once the grant exists.
    const GRANTED: &'static str;

    fn payment_id(payment: &Self::Payment) -> DbId;
    fn status(payment: &Self::Payment) -> Result<PaymentStatus, CoreError>;
    /// Whether `user_id` may verify this payment.
    fn verifiable_by(payment: &Self::Payment, user_id: DbId) -> bool;

    async fn find(pool: &PgPool, order_id: &str) -> Result<Option<Self::Payment>, sqlx::Error>;

    /// Fail a pending payment; `false` if unknown or already settled.
    async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<bool, sqlx::Error>;

    async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<Self::Payment, Self::Grant>>, sqlx::Error>;
}

/// Assets a signed-in user buys once and keeps.
#[async_trait]
pub trait Purchasable: PaymentLedger {
    async fn existing_grant(
        pool: &PgPool,
        user_id: DbId,
        asset_id: DbId,
    ) -> Result<Option<Self::Grant>, sqlx::Error>;

    async fn grant_free(
        pool: &PgPool,
        user_id: DbId,
        asset_id: DbId,
    ) -> Result<Self::Grant, sqlx::Error>;

    /// Newest pending order for the same buyer, asset and amount.
    async fn find_reusable_pending(
        pool: &PgPool,
        user_id: DbId,
        asset_id: DbId,
        amount: MinorUnits,
    ) -> Result<Option<Self::Payment>, sqlx::Error>;

    async fn create_pending(
        pool: &PgPool,
        asset_id: DbId,
        input: &NewPayment,
    ) -> Result<Self::Payment, sqlx::Error>;

    /// Order id, amount and currency of a pending payment.
    fn order_parts(payment: Self::Payment) -> (String, MinorUnits, String);
}

pub struct CourseLedger;
pub struct FileLedger;
pub struct FormLedger;

#[async_trait]
impl PaymentLedger for CourseLedger {
    type Payment = CoursePayment;
    type Grant = Enrollment;
    const KIND: &'static str = "course";
    const GRANTED: &'static str = STATUS_ENROLLED;

    fn payment_id(payment: &CoursePayment) -> DbId {
        payment.id
    }

    fn status(payment: &CoursePayment) -> Result<PaymentStatus, CoreError> {
        payment.payment_status()
    }

    fn verifiable_by(payment: &CoursePayment, user_id: DbId) -> bool {
        payment.user_id == user_id
    }

    async fn find(pool: &PgPool, order_id: &str) -> Result<Option<CoursePayment>, sqlx::Error> {
        CoursePaymentRepo::find_by_order_id(pool, order_id).await
    }

    async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let failed = CoursePaymentRepo::mark_failed(pool, order_id, payment_id, signature).await?;
        Ok(failed.is_some())
    }

    async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<CoursePayment, Enrollment>>, sqlx::Error> {
        CoursePaymentRepo::complete(pool, order_id, payment_id, signature).await
    }
}

#[async_trait]
impl Purchasable for CourseLedger {
    async fn existing_grant(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        EnrollmentRepo::find(pool, user_id, course_id).await
    }

    async fn grant_free(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Enrollment, sqlx::Error> {
        EnrollmentRepo::grant_free(pool, user_id, course_id).await
    }

    async fn find_reusable_pending(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
        amount: MinorUnits,
    ) -> Result<Option<CoursePayment>, sqlx::Error> {
        CoursePaymentRepo::find_reusable_pending(pool, user_id, course_id, amount).await
    }

    async fn create_pending(
        pool: &PgPool,
        course_id: DbId,
        input: &NewPayment,
    ) -> Result<CoursePayment, sqlx::Error> {
        CoursePaymentRepo::create_pending(pool, course_id, input).await
    }

    fn order_parts(payment: CoursePayment) -> (String, MinorUnits, String) {
        (payment.provider_order_id, payment.amount_paise, payment.currency)
    }
}

#[async_trait]
impl PaymentLedger for FileLedger {
    type Payment = FilePayment;
    type Grant = PurchasedFile;
    const KIND: &'static str = "file";
    const GRANTED: &'static str = STATUS_PURCHASED;

    fn payment_id(payment: &FilePayment) -> DbId {
        payment.id
    }

    fn status(payment: &FilePayment) -> Result<PaymentStatus, CoreError> {
        payment.payment_status()
    }

    fn verifiable_by(payment: &FilePayment, user_id: DbId) -> bool {
        payment.user_id == user_id
    }

    async fn find(pool: &PgPool, order_id: &str) -> Result<Option<FilePayment>, sqlx::Error> {
        FilePaymentRepo::find_by_order_id(pool, order_id).await
    }

    async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let failed = FilePaymentRepo::mark_failed(pool, order_id, payment_id, signature).await?;
        Ok(failed.is_some())
    }

    async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<FilePayment, PurchasedFile>>, sqlx::Error> {
        FilePaymentRepo::complete(pool, order_id, payment_id, signature).await
    }
}

#[async_trait]
impl Purchasable for FileLedger {
    async fn existing_grant(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
    ) -> Result<Option<PurchasedFile>, sqlx::Error> {
        PurchasedFileRepo::find(pool, user_id, file_id).await
    }

    async fn grant_free(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
    ) -> Result<PurchasedFile, sqlx::Error> {
        PurchasedFileRepo::grant_free(pool, user_id, file_id).await
    }

    async fn find_reusable_pending(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
        amount: MinorUnits,
    ) -> Result<Option<FilePayment>, sqlx::Error> {
        FilePaymentRepo::find_reusable_pending(pool, user_id, file_id, amount).await
    }

    async fn create_pending(
        pool: &PgPool,
        file_id: DbId,
        input: &NewPayment,
    ) -> Result<FilePayment, sqlx::Error> {
        FilePaymentRepo::create_pending(pool, file_id, input).await
    }

    fn order_parts(payment: FilePayment) -> (String, MinorUnits, String) {
        (payment.provider_order_id, payment.amount_paise, payment.currency)
    }
}

#[async_trait]
impl PaymentLedger for FormLedger {
    type Payment = FormPayment;
    type Grant = FormSubmission;
    const KIND: &'static str = "form";
    const GRANTED: &'static str = STATUS_SUBMITTED;

    fn payment_id(payment: &FormPayment) -> DbId {
        payment.id
    }

    fn status(payment: &FormPayment) -> Result<PaymentStatus, CoreError> {
        payment.payment_status()
    }

    /// Anonymous orders may be verified by any signed-in holder of a valid
    /// signature.
    fn verifiable_by(payment: &FormPayment, user_id: DbId) -> bool {
        payment.user_id.is_none_or(|owner| owner == user_id)
    }

    async fn find(pool: &PgPool, order_id: &str) -> Result<Option<FormPayment>, sqlx::Error> {
        FormPaymentRepo::find_by_order_id(pool, order_id).await
    }

    async fn mark_failed(
        pool: &PgPool,
        order_id: &str,
        payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let failed = FormPaymentRepo::mark_failed(pool, order_id, payment_id, signature).await?;
        Ok(failed.is_some())
    }

    async fn complete(
        pool: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<Option<Settlement<FormPayment, FormSubmission>>, sqlx::Error> {
        FormPaymentRepo::complete(pool, order_id, payment_id, signature).await
    }
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Grant access to an asset costing `amount`, or hand back a checkout order.
///
/// Idempotent: an existing grant is returned with 200, a free asset is granted
/// at once, and a retried checkout for the same amount reuses the open order.
pub async fn purchase<L: Purchasable>(
    state: &AppState,
    user_id: DbId,
    asset_id: DbId,
    amount: MinorUnits,
    currency: &str,
) -> AppResult<(StatusCode, PurchaseResponse<L::Grant>)> {
    if let Some(grant) = L::existing_grant(&state.pool, user_id, asset_id).await? {
        return Ok((StatusCode::OK, PurchaseResponse::granted(L::GRANTED, grant)));
    }

    if amount == 0 {
        let grant = L::grant_free(&state.pool, user_id, asset_id).await?;
        tracing::info!(kind = L::KIND, asset_id, user_id, "Free access granted");
        return Ok((StatusCode::CREATED, PurchaseResponse::granted(L::GRANTED, grant)));
    }

    let payment = match L::find_reusable_pending(&state.pool, user_id, asset_id, amount).await? {
        Some(pending) => {
            tracing::debug!(kind = L::KIND, asset_id, user_id, "Reusing pending order");
            pending
        }
        None => {
            let gateway_order =
                open_order(state, L::KIND, Some(user_id), asset_id, amount, currency).await?;
            let payment = L::create_pending(
                &state.pool,
                asset_id,
                &NewPayment {
                    user_id: Some(user_id),
                    provider_order_id: gateway_order.id,
                    amount_paise: amount,
                    currency: currency.to_string(),
                },
            )
            .await?;
            tracing::info!(
                kind = L::KIND,
                asset_id,
                user_id,
                payment_id = L::payment_id(&payment),
                amount,
                "Checkout started",
            );
            payment
        }
    };

    let (order_id, amount, currency) = L::order_parts(payment);
    Ok((
        StatusCode::CREATED,
        PurchaseResponse::payment_required(checkout_order(state, order_id, amount, currency)),
    ))
}

/// Confirm a checkout the caller completed in the browser widget.
///
/// A bad signature on a pending payment fails it for good. Verifying an
/// already successful payment returns the grant again.
pub async fn verify_checkout<L: PaymentLedger>(
    state: &AppState,
    user_id: DbId,
    input: &VerifyPaymentRequest,
) -> AppResult<PurchaseResponse<L::Grant>> {
    let payment = L::find(&state.pool, &input.order_id)
        .await?
        .filter(|p| L::verifiable_by(p, user_id))
        .ok_or_else(|| order_not_found(&input.order_id))?;

    match L::status(&payment)? {
        PaymentStatus::Failed => return Err(payment_already_failed()),
        PaymentStatus::Success => {}
        PaymentStatus::Pending => {
            if !signature_is_valid(state, input) {
                L::mark_failed(
                    &state.pool,
                    &input.order_id,
                    Some(&input.payment_id),
                    Some(&input.signature),
                )
                .await?;
                tracing::warn!(
                    kind = L::KIND,
                    user_id,
                    order_id = %input.order_id,
                    "Payment signature mismatch",
                );
                return Err(signature_mismatch());
            }
        }
    }

    let settlement = L::complete(
        &state.pool,
        &input.order_id,
        &input.payment_id,
        Some(&input.signature),
    )
    .await?
    .ok_or_else(|| order_not_found(&input.order_id))?;

    let grant = match settlement {
        Settlement::Completed(payment, grant) => {
            tracing::info!(
                kind = L::KIND,
                user_id,
                payment_id = L::payment_id(&payment),
                "Payment completed",
            );
            grant
        }
        Settlement::AlreadyCompleted(_, grant) => grant,
        Settlement::AlreadyFailed(_) => return Err(payment_already_failed()),
    };

    Ok(PurchaseResponse::granted(L::GRANTED, grant))
}

/// Settle `order_id` as captured if it belongs to this ledger.
///
/// `None` for an unknown order; otherwise whether this call moved it to
/// success.
pub async fn capture<L: PaymentLedger>(
    pool: &PgPool,
    order_id: &str,
    payment_id: &str,
) -> AppResult<Option<bool>> {
    let settled = L::complete(pool, order_id, payment_id, None).await?;
    Ok(settled.map(|s| matches!(s, Settlement::Completed(..))))
}

// ---------------------------------------------------------------------------
// Gateway helpers
// ---------------------------------------------------------------------------

/// Build the checkout payload for an order id known to the caller.
pub fn checkout_order(
    state: &AppState,
    order_id: String,
    amount: MinorUnits,
    currency: String,
) -> CheckoutOrder {
    CheckoutOrder {
        order_id,
        amount,
        currency,
        key_id: state.config.razorpay.key_id.clone(),
    }
}

/// Open a gateway order for `amount` minor units.
///
/// `kind` prefixes the receipt (`course`, `file`, `form`) and is stored in the
/// order notes with the asset id so the gateway dashboard stays readable.
pub async fn open_order(
    state: &AppState,
    kind: &str,
    user_id: Option<DbId>,
    asset_id: DbId,
    amount: MinorUnits,
    currency: &str,
) -> AppResult<GatewayOrder> {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let request = OrderRequest {
        amount,
        currency: currency.to_string(),
        receipt: make_receipt(kind, user_id.unwrap_or(0), asset_id, &nonce[..8]),
        notes: json!({
            "kind": kind,
            "asset_id": asset_id,
            "user_id": user_id,
        }),
    };

    let order = state.gateway.create_order(&request).await?;
    tracing::info!(
        kind,
        asset_id,
        amount,
        order_id = %order.id,
        "Gateway order created",
    );
    Ok(order)
}

/// Check the checkout signature with the configured key secret.
///
/// A missing secret means no signature can be trusted.
pub fn signature_is_valid(state: &AppState, input: &VerifyPaymentRequest) -> bool {
    let secret = &state.config.razorpay.key_secret;
    !secret.is_empty()
        && verify_signature(secret, &input.order_id, &input.payment_id, &input.signature)
}

pub fn signature_mismatch() -> AppError {
    AppError::Core(CoreError::Validation(
        "Payment signature verification failed".into(),
    ))
}

pub fn payment_already_failed() -> AppError {
    AppError::Core(CoreError::Conflict(
        "Payment has already failed; start a new checkout".into(),
    ))
}

pub fn order_not_found(order_id: &str) -> AppError {
    AppError::Core(CoreError::NotFoundBySlug {
        entity: "Payment order",
        slug: order_id.to_string(),
    })
}
