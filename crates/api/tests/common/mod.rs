//! Shared helpers for HTTP integration tests: app construction with in-memory
//! storage and gateway fakes, request builders and user fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use eduportal_api::auth::jwt::{issue_tokens, JwtConfig};
use eduportal_api::auth::password::hash_password;
use eduportal_api::config::{DeployConfig, RazorpayConfig, ServerConfig, StorageConfig};
use eduportal_api::router::build_app_router;
use eduportal_api::services::gateway::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};
use eduportal_api::services::storage::{ObjectStorage, StorageError};
use eduportal_api::state::AppState;
use eduportal_core::payment::{compute_signature, compute_webhook_signature};
use eduportal_core::roles::{ROLE_ADMIN, ROLE_USER};
use eduportal_db::models::user::{NewUser, User};
use eduportal_db::repositories::UserRepo;

pub const TEST_KEY_ID: &str = "rzp_test_key";
pub const TEST_KEY_SECRET: &str = "rzp_test_secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";
pub const TEST_DEPLOY_SECRET: &str = "deploy-me";
pub const TEST_PASSWORD: &str = "test_password_123!";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// In-memory object storage.
#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl FakeStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presigned_get(&self, key: &str, file_name: &str) -> Result<String, StorageError> {
        Ok(format!("https://storage.test/{key}?download={file_name}&signature=fake"))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.test/{key}")
    }
}

/// Gateway that hands out sequential order ids and records every request.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<OrderRequest>>,
    counter: AtomicUsize,
}

impl FakeGateway {
    pub fn order_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        Ok(GatewayOrder {
            id: format!("order_test_{n}"),
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults and known secrets.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        jwt: JwtConfig {
            secret: "test-jwt-secret-that-is-long-enough".to_string(),
            access_ttl_mins: 15,
            refresh_ttl_days: 7,
        },
        razorpay: RazorpayConfig {
            key_id: TEST_KEY_ID.to_string(),
            key_secret: TEST_KEY_SECRET.to_string(),
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        },
        storage: StorageConfig {
            bucket: "test-bucket".to_string(),
            region: "ap-south-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            public_base_url: None,
            presign_secs: 900,
        },
        deploy: DeployConfig {
            secret: Some(TEST_DEPLOY_SECRET.to_string()),
            dir: ".".to_string(),
            command: "true".to_string(),
        },
    }
}

/// The application under test plus handles on its fakes.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: ServerConfig,
    pub storage: Arc<FakeStorage>,
    pub gateway: Arc<FakeGateway>,
}

/// Build the full router (same middleware as production) with fakes.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> TestApp {
    let storage = Arc::new(FakeStorage::default());
    let gateway = Arc::new(FakeGateway::default());

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        storage: storage.clone(),
        gateway: gateway.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        config,
        storage,
        gateway,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user directly and return it with a valid access token.
pub async fn create_user(pool: &PgPool, name: &str, role: &str) -> (User, String) {
    let input = NewUser {
        name: name.to_string(),
        email: format!("{name}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: role.to_string(),
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    let token = issue_tokens(user.id, &user.role, &test_config().jwt)
        .expect("token generation should succeed")
        .access_token;
    (user, token)
}

pub async fn admin_token(pool: &PgPool) -> String {
    create_user(pool, "admin", ROLE_ADMIN).await.1
}

pub async fn user_token(pool: &PgPool, name: &str) -> (User, String) {
    create_user(pool, name, ROLE_USER).await
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    get_auth(router, uri, None).await
}

pub async fn get_auth(router: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let request = with_auth(Request::get(uri), token)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    body: Value,
    token: Option<&str>,
) -> Response<Body> {
    let request = with_auth(Request::builder().method(method).uri(uri), token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> Response<Body> {
    json_request(router, "POST", uri, body, None).await
}

pub async fn post_json_auth(router: &Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    json_request(router, "POST", uri, body, Some(token)).await
}

pub async fn put_json_auth(router: &Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    json_request(router, "PUT", uri, body, Some(token)).await
}

pub async fn post_auth(router: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = with_auth(Request::post(uri), Some(token))
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn delete_auth(router: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = with_auth(Request::delete(uri), Some(token))
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

/// POST raw bytes with extra headers (webhooks, deploy hook).
pub async fn post_raw(router: &Router, uri: &str, body: Vec<u8>, headers: &[(&str, &str)]) -> Response<Body> {
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(router, builder.body(Body::from(body)).unwrap()).await
}

/// A file part for [`post_multipart`].
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

const BOUNDARY: &str = "----eduportal-test-boundary";

/// POST a `multipart/form-data` body.
pub async fn post_multipart(
    router: &Router,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
) -> Response<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                file.field, file.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = with_auth(Request::post(uri), Some(token))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Verify body carrying a valid checkout signature.
pub fn verify_body(order_id: &str, payment_id: &str) -> Value {
    json!({
        "order_id": order_id,
        "payment_id": payment_id,
        "signature": compute_signature(TEST_KEY_SECRET, order_id, payment_id),
    })
}

/// Gateway webhook payload for a payment event.
pub fn payment_event(event: &str, order_id: &str, payment_id: &str) -> Value {
    json!({
        "event": event,
        "payload": { "payment": { "entity": { "id": payment_id, "order_id": order_id } } }
    })
}

pub fn captured(order_id: &str, payment_id: &str) -> Value {
    payment_event("payment.captured", order_id, payment_id)
}

/// Deliver a correctly signed webhook.
pub async fn send_webhook(app: &TestApp, payload: Value) -> StatusCode {
    let body = serde_json::to_vec(&payload).unwrap();
    let signature = compute_webhook_signature(TEST_WEBHOOK_SECRET, &body);
    post_raw(
        &app.router,
        "/api/v1/payments/webhook",
        body,
        &[("x-razorpay-signature", signature.as_str())],
    )
    .await
    .status()
}
