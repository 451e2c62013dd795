//! HTTP-level tests for course checkout, payment verification and the
//! gateway webhook.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, captured, get_auth, payment_event, post_auth, post_json_auth,
    post_raw, send_webhook, user_token, verify_body, TEST_KEY_ID,
};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a published paid course and return its id.
async fn paid_course(app: &common::TestApp, admin: &str) -> i64 {
    let response = post_json_auth(
        &app.router,
        "/api/v1/courses",
        json!({
            "title": "Systems Design",
            "pricing_model": "paid",
            "price_paise": 99900,
            "sale_price_paise": 79900,
            "status": "published",
        }),
        admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn purchase(app: &common::TestApp, course_id: i64, token: &str) -> (StatusCode, Value) {
    let response = post_auth(
        &app.router,
        &format!("/api/v1/courses/{course_id}/purchase"),
        token,
    )
    .await;
    let status = response.status();
    (status, body_json(response).await["data"].clone())
}

async fn enrolled(app: &common::TestApp, course_id: i64, token: &str) -> bool {
    let response = get_auth(
        &app.router,
        &format!("/api/v1/courses/{course_id}/enrollment"),
        Some(token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["enrolled"].as_bool().unwrap()
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_paid_course_opens_order_at_sale_price(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (status, data) = purchase(&app, course_id, &learner).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data["status"], "payment_required");
    assert_eq!(data["order"]["order_id"], "order_test_1");
    assert_eq!(data["order"]["amount"], 79900);
    assert_eq!(data["order"]["currency"], "INR");
    assert_eq!(data["order"]["key_id"], TEST_KEY_ID);
    assert!(data.get("grant").is_none());

    let requests = app.gateway.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, 79900);
    assert!(requests[0].receipt.starts_with("course_"));
    assert!(requests[0].receipt.len() <= 40);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retried_checkout_reuses_pending_order(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (_, first) = purchase(&app, course_id, &learner).await;
    let (status, second) = purchase(&app, course_id, &learner).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["order"]["order_id"], second["order"]["order_id"]);
    assert_eq!(app.gateway.order_count(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unpublished_course_cannot_be_bought(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(&app.router, "/api/v1/courses", json!({ "title": "WIP" }), &admin)
        .await;
    let course_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let (status, _) = purchase(&app, course_id, &learner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.gateway.order_count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_purchase_requires_login(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let response = common::post_json(
        &app.router,
        &format!("/api/v1/courses/{course_id}/purchase"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verified_payment_enrolls_once(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (_, data) = purchase(&app, course_id, &learner).await;
    let order_id = data["order"]["order_id"].as_str().unwrap().to_string();
    assert!(!enrolled(&app, course_id, &learner).await);

    let response = post_json_auth(
        &app.router,
        "/api/v1/payments/verify",
        verify_body(&order_id, "pay_001"),
        &learner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "enrolled");
    assert_eq!(data["grant"]["course_id"], course_id);
    assert_eq!(data["grant"]["user_id"], user.id);
    let enrollment_id = data["grant"]["id"].clone();

    // Verifying again is idempotent.
    let response = post_json_auth(
        &app.router,
        "/api/v1/payments/verify",
        verify_body(&order_id, "pay_001"),
        &learner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["grant"]["id"], enrollment_id);

    assert!(enrolled(&app, course_id, &learner).await);

    // An enrolled buyer gets the enrollment back instead of a new order.
    let (status, data) = purchase(&app, course_id, &learner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["status"], "enrolled");
    assert_eq!(app.gateway.order_count(), 1);

    let mine = body_json(get_auth(&app.router, "/api/v1/me/enrollments", Some(&learner)).await).await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
    assert_eq!(mine["data"][0]["course_slug"], "systems-design");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bad_signature_fails_the_payment(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (_, data) = purchase(&app, course_id, &learner).await;
    let order_id = data["order"]["order_id"].as_str().unwrap().to_string();

    let response = post_json_auth(
        &app.router,
        "/api/v1/payments/verify",
        json!({ "order_id": order_id, "payment_id": "pay_x", "signature": "deadbeef" }),
        &learner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    // The failed order is terminal, even with a correct signature.
    let response = post_json_auth(
        &app.router,
        "/api/v1/payments/verify",
        verify_body(&order_id, "pay_x"),
        &learner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(!enrolled(&app, course_id, &learner).await);

    // A fresh checkout opens a new order.
    let (_, data) = purchase(&app, course_id, &learner).await;
    assert_ne!(data["order"]["order_id"], order_id.as_str());
    assert_eq!(app.gateway.order_count(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cannot_verify_someone_elses_order(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_buyer, buyer) = user_token(&pool, "buyer").await;
    let (_other, other) = user_token(&pool, "other").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (_, data) = purchase(&app, course_id, &buyer).await;
    let order_id = data["order"]["order_id"].as_str().unwrap().to_string();

    let response = post_json_auth(
        &app.router,
        "/api/v1/payments/verify",
        verify_body(&order_id, "pay_001"),
        &other,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!enrolled(&app, course_id, &other).await);
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_webhook_capture_enrolls_buyer(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (_, data) = purchase(&app, course_id, &learner).await;
    let order_id = data["order"]["order_id"].as_str().unwrap().to_string();

    assert_eq!(send_webhook(&app, captured(&order_id, "pay_hook")).await, StatusCode::OK);
    assert!(enrolled(&app, course_id, &learner).await);

    // Redelivery is acknowledged and changes nothing.
    assert_eq!(send_webhook(&app, captured(&order_id, "pay_hook")).await, StatusCode::OK);

    // The browser callback arriving late still succeeds.
    let response = post_json_auth(
        &app.router,
        "/api/v1/payments/verify",
        verify_body(&order_id, "pay_hook"),
        &learner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "enrolled");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_webhook_failure_then_capture_is_ignored(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "buyer").await;
    let app = common::build_test_app(pool);
    let course_id = paid_course(&app, &admin).await;

    let (_, data) = purchase(&app, course_id, &learner).await;
    let order_id = data["order"]["order_id"].as_str().unwrap().to_string();

    let failed = payment_event("payment.failed", &order_id, "pay_f");
    assert_eq!(send_webhook(&app, failed).await, StatusCode::OK);
    assert_eq!(send_webhook(&app, captured(&order_id, "pay_late")).await, StatusCode::OK);
    assert!(!enrolled(&app, course_id, &learner).await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_webhook_rejects_bad_signature(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = serde_json::to_vec(&captured("order_x", "pay_x")).unwrap();

    let response = post_raw(
        &app.router,
        "/api/v1/payments/webhook",
        body.clone(),
        &[("x-razorpay-signature", "00ff")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_raw(&app.router, "/api/v1/payments/webhook", body, &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_webhook_acknowledges_unknown_orders_and_events(pool: PgPool) {
    let app = common::build_test_app(pool);

    assert_eq!(send_webhook(&app, captured("order_unknown", "pay_1")).await, StatusCode::OK);
    assert_eq!(
        send_webhook(&app, json!({ "event": "refund.processed", "payload": {} })).await,
        StatusCode::OK
    );
}
