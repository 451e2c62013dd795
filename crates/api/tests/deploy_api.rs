//! HTTP-level tests for the deploy hook.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_raw, TEST_DEPLOY_SECRET};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_valid_secret_starts_deploy(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_raw(
        &app.router,
        "/api/v1/deploy",
        Vec::new(),
        &[("x-deploy-secret", TEST_DEPLOY_SECRET)],
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["data"]["status"], "deploying");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wrong_or_missing_secret_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_raw(&app.router, "/api/v1/deploy", Vec::new(), &[("x-deploy-secret", "guess")]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_raw(&app.router, "/api/v1/deploy", Vec::new(), &[]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unconfigured_hook_is_hidden(pool: PgPool) {
    let mut config = common::test_config();
    config.deploy.secret = None;
    let app = common::build_test_app_with(pool, config);

    let response = post_raw(&app.router, "/api/v1/deploy", Vec::new(), &[("x-deploy-secret", "")]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
