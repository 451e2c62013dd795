//! HTTP error type.
//!
//! Every failure leaves a handler as [`AppError`] and is rendered as
//! `{ "error": <message>, "code": <CODE> }`. Upstream and internal failures
//! are logged in full and returned with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eduportal_core::error::CoreError;
use eduportal_db::DbError;
use serde::Serialize;

use crate::services::gateway::GatewayError;
use crate::services::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The payment gateway failed or is not configured.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Malformed input that never reached domain validation.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body above `MAX_UPLOAD_BYTES`.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlx(e) => AppError::Database(e),
            DbError::Core(e) => AppError::Core(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Status, machine-readable code and client-facing message.
type Rendered = (StatusCode, &'static str, String);

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> Rendered {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn render_core(err: &CoreError) -> Rendered {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::NotFoundBySlug { entity, slug } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} '{slug}' not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Map constraint violations to client errors by Postgres error code.
///
/// Only `uq_*` unique constraints are treated as conflicts; any other unique
/// violation is a bug and surfaces as 500.
fn render_sqlx(err: &sqlx::Error) -> Rendered {
    if let sqlx::Error::RowNotFound = err {
        return (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        );
    }

    if let Some(db_err) = err.as_database_error() {
        let constraint = db_err.constraint().unwrap_or("unknown");
        let client_error = match db_err.code().as_deref() {
            Some("23505") if constraint.starts_with("uq_") => Some((
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            )),
            Some("23503") => Some((
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                format!("Referenced record does not exist: {constraint}"),
            )),
            Some("23514") => Some((
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Value violates check constraint: {constraint}"),
            )),
            _ => None,
        };
        if let Some(rendered) = client_error {
            return rendered;
        }
    }

    tracing::error!(error = %err, "Database error");
    internal()
}

impl AppError {
    fn render(&self) -> Rendered {
        match self {
            AppError::Core(core) => render_core(core),
            AppError::Database(err) => render_sqlx(err),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "Object storage failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "BAD_GATEWAY",
                    "File storage is unavailable".to_string(),
                )
            }
            AppError::Gateway(err) => {
                tracing::error!(error = %err, "Payment gateway failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "BAD_GATEWAY",
                    "Payment gateway is unavailable".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.render();
        (status, Json(ErrorBody { error, code })).into_response()
    }
}
