//! HTTP-level tests for the downloadable file catalogue and file purchases.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, captured, delete_auth, get, get_auth, payment_event, post_json_auth,
    post_multipart, put_json_auth, send_webhook, user_token, verify_body, FilePart,
    TEST_KEY_SECRET,
};
use eduportal_core::payment::compute_signature;
use serde_json::{json, Value};
use sqlx::PgPool;

async fn upload(app: &common::TestApp, admin: &str, fields: &[(&str, &str)]) -> (StatusCode, Value) {
    let response = post_multipart(
        &app.router,
        "/api/v1/files",
        admin,
        fields,
        Some(FilePart {
            field: "file",
            file_name: "Interview Guide.pdf",
            bytes: b"%PDF-1.4 test",
        }),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Upload a paid file and open a checkout for `token`; returns the file id and
/// order id.
async fn paid_file_order(app: &common::TestApp, admin: &str, token: &str) -> (i64, String) {
    let (_, json) = upload(app, admin, &[("title", "Mock Tests"), ("price_paise", "9900")]).await;
    let id = json["data"]["id"].as_i64().unwrap();

    let response =
        post_json_auth(&app.router, "/api/v1/files/purchase", json!({ "file_id": id }), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = body_json(response).await["data"]["order"]["order_id"]
        .as_str()
        .unwrap()
        .to_string();
    (id, order_id)
}

async fn download_status(app: &common::TestApp, file_id: i64, token: &str) -> StatusCode {
    get_auth(&app.router, &format!("/api/v1/files/{file_id}/download"), Some(token))
        .await
        .status()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_uploads_file(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let app = common::build_test_app(pool);

    let (status, json) = upload(
        &app,
        &admin,
        &[("title", "Interview Guide"), ("is_free", "true")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let file = &json["data"];
    assert_eq!(file["slug"], "interview-guide");
    assert_eq!(file["file_name"], "Interview Guide.pdf");
    assert_eq!(file["content_type"], "application/pdf");
    assert_eq!(file["size_bytes"], 13);
    assert!(file.get("object_key").is_none(), "storage key must not leak");
    assert_eq!(app.storage.len(), 1);

    let listed = body_json(get(&app.router, "/api/v1/files").await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let response = get(&app.router, "/api/v1/files/interview-guide").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_validation(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "learner").await;
    let app = common::build_test_app(pool);

    // Paid without a price.
    let (status, _) = upload(&app, &admin, &[("title", "Paid Guide")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing file part.
    let response = post_multipart(&app.router, "/api/v1/files", &admin, &[("title", "Empty")], None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-admin.
    let (status, _) = upload(&app, &learner, &[("title", "Sneaky"), ("is_free", "true")]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.storage.len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_free_file_downloads_for_any_user(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "learner").await;
    let app = common::build_test_app(pool);

    let (_, json) = upload(&app, &admin, &[("title", "Free Notes"), ("is_free", "on")]).await;
    let id = json["data"]["id"].as_i64().unwrap();

    let response = get_auth(&app.router, &format!("/api/v1/files/{id}/download"), Some(&learner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let link = body_json(response).await["data"].clone();
    assert!(link["url"].as_str().unwrap().starts_with("https://storage.test/files/"));
    assert_eq!(link["file_name"], "Interview Guide.pdf");
    assert_eq!(link["expires_in"], 900);

    let response = get(&app.router, &format!("/api/v1/files/{id}/download")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_paid_file_purchase_flow(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "learner").await;
    let app = common::build_test_app(pool);

    let (_, json) = upload(&app, &admin, &[("title", "Premium Pack"), ("price_paise", "19900")]).await;
    let id = json["data"]["id"].as_i64().unwrap();

    assert_eq!(download_status(&app, id, &learner).await, StatusCode::FORBIDDEN);
    assert_eq!(download_status(&app, id, &admin).await, StatusCode::OK);

    let response = post_json_auth(&app.router, "/api/v1/files/purchase", json!({ "file_id": id }), &learner)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "payment_required");
    assert_eq!(data["order"]["amount"], 19900);
    let order_id = data["order"]["order_id"].as_str().unwrap().to_string();

    // Course verification does not know about file orders.
    let verify = json!({
        "order_id": order_id,
        "payment_id": "pay_file",
        "signature": compute_signature(TEST_KEY_SECRET, &order_id, "pay_file"),
    });
    let response = post_json_auth(&app.router, "/api/v1/payments/verify", verify.clone(), &learner).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json_auth(&app.router, "/api/v1/files/verify-payment", verify, &learner).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "purchased");
    assert_eq!(data["grant"]["file_id"], id);

    assert_eq!(download_status(&app, id, &learner).await, StatusCode::OK);

    let response = post_json_auth(&app.router, "/api/v1/files/purchase", json!({ "file_id": id }), &learner)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "purchased");

    let purchased = body_json(get_auth(&app.router, "/api/v1/files/purchased", Some(&learner)).await).await;
    assert_eq!(purchased["data"][0]["slug"], "premium-pack");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_delete_file(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let app = common::build_test_app(pool);

    let (_, json) = upload(&app, &admin, &[("title", "Old Title"), ("is_free", "1")]).await;
    let id = json["data"]["id"].as_i64().unwrap();

    // Turning a free file paid needs a price.
    let response = put_json_auth(&app.router, &format!("/api/v1/files/{id}"), json!({ "is_free": false }), &admin)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        &app.router,
        &format!("/api/v1/files/{id}"),
        json!({ "title": "New Title", "slug": "new-title", "is_free": false, "price_paise": 4900 }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let file = body_json(response).await["data"].clone();
    assert_eq!(file["slug"], "new-title");
    assert_eq!(file["price_paise"], 4900);

    let response = delete_auth(&app.router, &format!("/api/v1/files/{id}"), &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.storage.len(), 0);

    let response = delete_auth(&app.router, &format!("/api/v1/files/{id}"), &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_switching_paid_file_to_free(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "learner").await;
    let app = common::build_test_app(pool);

    let (_, json) = upload(&app, &admin, &[("title", "Formerly Paid"), ("price_paise", "4900")]).await;
    let id = json["data"]["id"].as_i64().unwrap();

    let response = put_json_auth(&app.router, &format!("/api/v1/files/{id}"), json!({ "is_free": true }), &admin)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let file = body_json(response).await["data"].clone();
    assert_eq!(file["is_free"], true);
    assert_eq!(file["price_paise"], 0);
    assert_eq!(download_status(&app, id, &learner).await, StatusCode::OK);

    let response = put_json_auth(
        &app.router,
        &format!("/api/v1/files/{id}"),
        json!({ "is_free": true, "price_paise": 500 }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Free items cannot carry a price");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bad_file_signature_fails_the_payment(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "learner").await;
    let app = common::build_test_app(pool);
    let (id, order_id) = paid_file_order(&app, &admin, &learner).await;

    let response = post_json_auth(&app.router, "/api/v1/files/purchase", json!({}), &learner).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let forged = json!({ "order_id": order_id, "payment_id": "pay_x", "signature": "deadbeef" });
    let response = post_json_auth(&app.router, "/api/v1/files/verify-payment", forged, &learner).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    // The failed payment is terminal even with a valid signature.
    let response = post_json_auth(
        &app.router,
        "/api/v1/files/verify-payment",
        verify_body(&order_id, "pay_x"),
        &learner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(download_status(&app, id, &learner).await, StatusCode::FORBIDDEN);

    // A new checkout opens a fresh order.
    let response =
        post_json_auth(&app.router, "/api/v1/files/purchase", json!({ "file_id": id }), &learner).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_ne!(body_json(response).await["data"]["order"]["order_id"], order_id.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_webhook_settles_file_orders(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, learner) = user_token(&pool, "learner").await;
    let (_other, other) = user_token(&pool, "other").await;
    let app = common::build_test_app(pool);

    let (id, order_id) = paid_file_order(&app, &admin, &learner).await;
    assert_eq!(send_webhook(&app, captured(&order_id, "pay_file_hook")).await, StatusCode::OK);
    assert_eq!(download_status(&app, id, &learner).await, StatusCode::OK);

    let response = post_json_auth(&app.router, "/api/v1/files/purchase", json!({ "file_id": id }), &learner)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A failure event fails the other buyer's order; a late capture changes nothing.
    let response = post_json_auth(&app.router, "/api/v1/files/purchase", json!({ "file_id": id }), &other)
        .await;
    let other_order = body_json(response).await["data"]["order"]["order_id"]
        .as_str()
        .unwrap()
        .to_string();
    let failed = payment_event("payment.failed", &other_order, "pay_declined");
    assert_eq!(send_webhook(&app, failed).await, StatusCode::OK);
    assert_eq!(send_webhook(&app, captured(&other_order, "pay_late")).await, StatusCode::OK);
    assert_eq!(download_status(&app, id, &other).await, StatusCode::FORBIDDEN);
}
