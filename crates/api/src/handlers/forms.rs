//! Handlers for dynamic forms, their submissions and paid-submission
//! verification.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_core::forms::{validate_definition, validate_submission, FieldSpec};
use eduportal_core::payment::validate_fee;
use eduportal_core::slug::resolve_slug;
use eduportal_core::status::PaymentStatus;
use eduportal_core::types::DbId;
use eduportal_db::models::form::{
    CreateForm, CreateFormField, FormSubmission, FormWithFields, SubmitForm, UpdateForm,
};
use eduportal_db::models::payment::{NewPayment, VerifyPaymentRequest};
use eduportal_db::repositories::{FormPaymentRepo, FormRepo, SubmissionRepo};
use serde_json::Value;

use super::checkout::{
    checkout_order, open_order, verify_checkout, FormLedger, PaymentLedger, PurchaseResponse,
    STATUS_SUBMITTED,
};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn form_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Form", id })
}

fn check_definition(fields: &[CreateFormField]) -> Result<(), CoreError> {
    let specs = fields
        .iter()
        .map(CreateFormField::spec)
        .collect::<Result<Vec<_>, _>>()?;
    validate_definition(&specs)
}

// ---------------------------------------------------------------------------
// Form definitions
// ---------------------------------------------------------------------------

/// GET /api/v1/forms
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<impl IntoResponse> {
    let forms = FormRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: forms }))
}

/// GET /api/v1/forms/{slug}
///
/// Inactive forms resolve for admins only.
pub async fn get_by_slug(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let is_admin = viewer.as_ref().is_some_and(AuthUser::is_admin);
    let form = FormRepo::find_by_slug(&state.pool, &slug)
        .await?
        .filter(|f| is_admin || f.is_active)
        .ok_or(AppError::Core(CoreError::NotFoundBySlug {
            entity: "Form",
            slug,
        }))?;

    let fields = FormRepo::fields_for(&state.pool, form.id).await?;
    Ok(Json(DataResponse {
        data: FormWithFields { form, fields },
    }))
}

/// POST /api/v1/forms
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(input): ValidatedJson<CreateForm>,
) -> AppResult<impl IntoResponse> {
    let slug = resolve_slug(input.slug.as_deref(), &input.title)?;
    check_definition(&input.fields)?;
    validate_fee(input.fee_paise.unwrap_or(0))?;

    let form = FormRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(
        form_id = form.form.id,
        fields = form.fields.len(),
        user_id = admin.user_id,
        "Form created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: form })))
}

/// PUT /api/v1/forms/{id}
///
/// A supplied `fields` list replaces the form's fields in one transaction.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateForm>,
) -> AppResult<impl IntoResponse> {
    let slug = input
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), ""))
        .transpose()?;
    if let Some(fields) = &input.fields {
        check_definition(fields)?;
    }
    if let Some(fee) = input.fee_paise {
        validate_fee(fee)?;
    }

    let form = FormRepo::update(&state.pool, id, &input, slug.as_deref())
        .await?
        .ok_or_else(|| form_not_found(id))?;
    Ok(Json(DataResponse { data: form }))
}

/// DELETE /api/v1/forms/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !FormRepo::delete(&state.pool, id).await? {
        return Err(form_not_found(id));
    }
    tracing::info!(form_id = id, user_id = admin.user_id, "Form deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// GET /api/v1/forms/{id}/submissions?limit=&offset=
pub async fn list_submissions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    FormRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| form_not_found(id))?;

    let (limit, offset) = params.resolve();
    let submissions = SubmissionRepo::list_by_form(&state.pool, id, limit, offset).await?;
    Ok(Json(DataResponse { data: submissions }))
}

/// POST /api/v1/forms/{id}/submissions
///
/// Open to anonymous visitors. Free forms store the submission as
/// successful; forms with a fee store it as pending behind a gateway order.
pub async fn submit(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<SubmitForm>,
) -> AppResult<impl IntoResponse> {
    let form = FormRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|f| f.is_active)
        .ok_or_else(|| form_not_found(id))?;

    let specs = FormRepo::fields_for(&state.pool, id)
        .await?
        .iter()
        .map(|f| f.spec())
        .collect::<Result<Vec<FieldSpec>, _>>()?;
    validate_submission(&specs, &input.data)?;

    let user_id = viewer.map(|u| u.user_id);
    let data = Value::Object(input.data);

    if form.fee_paise == 0 {
        let submission =
            SubmissionRepo::create(&state.pool, id, user_id, &data, PaymentStatus::Success)
                .await?;
        tracing::info!(form_id = id, submission_id = submission.id, "Form submitted");
        return Ok((
            StatusCode::CREATED,
            Json(DataResponse {
                data: PurchaseResponse::granted(STATUS_SUBMITTED, submission),
            }),
        ));
    }

    let gateway_order = open_order(
        &state,
        FormLedger::KIND,
        user_id,
        id,
        form.fee_paise,
        &form.currency,
    )
    .await?;
    let (submission, payment) = FormPaymentRepo::create_with_submission(
        &state.pool,
        id,
        &data,
        &NewPayment {
            user_id,
            provider_order_id: gateway_order.id,
            amount_paise: form.fee_paise,
            currency: form.currency,
        },
    )
    .await?;

    tracing::info!(
        form_id = id,
        submission_id = submission.id,
        payment_id = payment.id,
        "Paid form submission started",
    );

    let order = checkout_order(
        &state,
        payment.provider_order_id,
        payment.amount_paise,
        payment.currency,
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PurchaseResponse::<FormSubmission>::payment_required(order),
        }),
    ))
}

/// POST /api/v1/forms/payments/verify
///
/// Orders opened anonymously may be verified by any signed-in user holding a
/// valid signature; orders opened by a user only by that user.
pub async fn verify_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<VerifyPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let response = verify_checkout::<FormLedger>(&state, auth.user_id, &input).await?;
    Ok(Json(DataResponse { data: response }))
}
