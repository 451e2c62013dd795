//! Course payment verification and the gateway webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::payment::verify_webhook_signature;
use eduportal_db::models::payment::VerifyPaymentRequest;
use serde_json::Value;

use super::checkout::{self, verify_checkout, CourseLedger, FileLedger, FormLedger, PaymentLedger};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the webhook body signature.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-razorpay-signature";

// ---------------------------------------------------------------------------
// Checkout verification
// ---------------------------------------------------------------------------

/// POST /api/v1/payments/verify
///
/// Confirms a completed checkout for a course order owned by the caller.
pub async fn verify(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<VerifyPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let response = verify_checkout::<CourseLedger>(&state, auth.user_id, &input).await?;
    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// What a webhook delivery asks us to do.
#[derive(Debug, PartialEq, Eq)]
enum WebhookAction {
    Capture {
        order_id: String,
        payment_id: String,
    },
    Fail {
        order_id: String,
        payment_id: Option<String>,
    },
    Ignore,
}

/// Interpret a webhook payload. Events other than captures and failures, and
/// payloads without an order id, are ignored.
fn parse_webhook(payload: &Value) -> WebhookAction {
    let event = payload["event"].as_str().unwrap_or_default();
    let payment = &payload["payload"]["payment"]["entity"];
    let order_id = payment["order_id"]
        .as_str()
        .or_else(|| payload["payload"]["order"]["entity"]["id"].as_str())
        .map(str::to_string);
    let payment_id = payment["id"].as_str().map(str::to_string);

    match (event, order_id) {
        ("payment.captured" | "order.paid", Some(order_id)) => WebhookAction::Capture {
            order_id,
            payment_id: payment_id.unwrap_or_default(),
        },
        ("payment.failed", Some(order_id)) => WebhookAction::Fail {
            order_id,
            payment_id,
        },
        _ => WebhookAction::Ignore,
    }
}

/// POST /api/v1/payments/webhook
///
/// Signed with the webhook secret over the raw body. Orders are looked up
/// across course, file and form payments; unknown orders are acknowledged.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    let secret = &state.config.razorpay.webhook_secret;
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if secret.is_empty() || !verify_webhook_signature(secret, &body, signature) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(AppError::BadRequest("Invalid webhook signature".into()));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    match parse_webhook(&payload) {
        WebhookAction::Capture {
            order_id,
            payment_id,
        } => capture(&state, &order_id, &payment_id).await?,
        WebhookAction::Fail {
            order_id,
            payment_id,
        } => fail(&state, &order_id, payment_id.as_deref()).await?,
        WebhookAction::Ignore => {
            tracing::debug!(event = ?payload["event"], "Ignoring webhook event");
        }
    }

    Ok(StatusCode::OK)
}

async fn capture(state: &AppState, order_id: &str, payment_id: &str) -> AppResult<()> {
    let pool = &state.pool;

    let outcome = match checkout::capture::<CourseLedger>(pool, order_id, payment_id).await? {
        Some(moved) => Some((CourseLedger::KIND, moved)),
        None => match checkout::capture::<FileLedger>(pool, order_id, payment_id).await? {
            Some(moved) => Some((FileLedger::KIND, moved)),
            None => checkout::capture::<FormLedger>(pool, order_id, payment_id)
                .await?
                .map(|moved| (FormLedger::KIND, moved)),
        },
    };

    match outcome {
        Some((kind, true)) => tracing::info!(kind, order_id, "Payment captured via webhook"),
        Some((kind, false)) => {
            tracing::debug!(kind, order_id, "Webhook capture for settled payment");
        }
        None => tracing::warn!(order_id, "Webhook capture for unknown order"),
    }
    Ok(())
}

async fn fail(state: &AppState, order_id: &str, payment_id: Option<&str>) -> AppResult<()> {
    let pool = &state.pool;

    let failed = CourseLedger::mark_failed(pool, order_id, payment_id, None).await?
        || FileLedger::mark_failed(pool, order_id, payment_id, None).await?
        || FormLedger::mark_failed(pool, order_id, payment_id, None).await?;

    if failed {
        tracing::info!(order_id, "Payment failed via webhook");
    } else {
        tracing::debug!(order_id, "Webhook failure for unknown or settled order");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn captured_payment_event() {
        let payload = json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": { "id": "pay_1", "order_id": "order_1" } } }
        });
        assert_eq!(
            parse_webhook(&payload),
            WebhookAction::Capture {
                order_id: "order_1".into(),
                payment_id: "pay_1".into()
            }
        );
    }

    #[test]
    fn order_paid_falls_back_to_order_entity() {
        let payload = json!({
            "event": "order.paid",
            "payload": { "order": { "entity": { "id": "order_2" } } }
        });
        assert_eq!(
            parse_webhook(&payload),
            WebhookAction::Capture {
                order_id: "order_2".into(),
                payment_id: String::new()
            }
        );
    }

    #[test]
    fn failed_and_unrelated_events() {
        let failed = json!({
            "event": "payment.failed",
            "payload": { "payment": { "entity": { "id": "pay_3", "order_id": "order_3" } } }
        });
        assert_eq!(
            parse_webhook(&failed),
            WebhookAction::Fail {
                order_id: "order_3".into(),
                payment_id: Some("pay_3".into())
            }
        );
        assert_eq!(parse_webhook(&json!({ "event": "refund.created" })), WebhookAction::Ignore);
        assert_eq!(parse_webhook(&json!({ "event": "payment.captured" })), WebhookAction::Ignore);
    }
}
