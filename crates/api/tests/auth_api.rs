//! HTTP-level tests for registration, login, token refresh and logout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_auth, post_json, TEST_PASSWORD};
use eduportal_core::roles::{ROLE_ADMIN, ROLE_USER};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn login(app: &common::TestApp, email: &str, password: &str) -> (StatusCode, Value) {
    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_signs_in_as_user(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "name": "  Asha Rao ", "email": "Asha@Example.com", "password": "correct horse" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert!(data["expires_in"].is_number());
    assert_eq!(data["user"]["name"], "Asha Rao");
    assert_eq!(data["user"]["email"], "asha@example.com");
    assert_eq!(data["user"]["role"], ROLE_USER);
    assert!(data["user"].get("password_hash").is_none());

    let token = data["access_token"].as_str().unwrap();
    let me = body_json(get_auth(&app.router, "/api/v1/auth/me", Some(token)).await).await;
    assert_eq!(me["data"]["email"], "asha@example.com");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_duplicates_and_bad_input(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = json!({ "name": "Ravi", "email": "ravi@example.com", "password": "longenough" });

    let response = post_json(&app.router, "/api/v1/auth/register", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(&app.router, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "name": "Short", "email": "not-an-email", "password": "123" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success_and_failures(pool: PgPool) {
    let (user, _token) = common::create_user(&pool, "instructor", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);

    let (status, json) = login(&app, "instructor@test.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["user"]["id"], user.id);
    assert_eq!(json["data"]["user"]["role"], ROLE_ADMIN);

    let (status, _) = login(&app, "instructor@test.com", "wrong password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "nobody@test.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inactive_account_cannot_login(pool: PgPool) {
    let (user, _) = common::create_user(&pool, "dormant", ROLE_USER).await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let (status, _) = login(&app, "dormant@test.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_rotates_token(pool: PgPool) {
    common::create_user(&pool, "rotator", ROLE_USER).await;
    let app = common::build_test_app(pool);

    let (_, json) = login(&app, "rotator@test.com", TEST_PASSWORD).await;
    let refresh_token = json["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        &app.router,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["data"]["refresh_token"], refresh_token.as_str());

    // The old token is spent.
    let response = post_json(
        &app.router,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_revokes_refresh_tokens(pool: PgPool) {
    common::create_user(&pool, "leaver", ROLE_USER).await;
    let app = common::build_test_app(pool);

    let (_, json) = login(&app, "leaver@test.com", TEST_PASSWORD).await;
    let access = json["data"]["access_token"].as_str().unwrap().to_string();
    let refresh_token = json["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = post_auth(&app.router, "/api/v1/auth/logout", &access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        &app.router,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_requires_valid_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(&app.router, "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(&app.router, "/api/v1/auth/me", Some("garbage.token.value")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
