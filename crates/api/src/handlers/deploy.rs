//! Handler for the `/deploy` hook.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use eduportal_core::error::CoreError;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::services::deploy::{secret_matches, spawn_deploy};
use crate::state::AppState;

/// Header carrying the shared deploy secret.
pub const DEPLOY_SECRET_HEADER: &str = "x-deploy-secret";

#[derive(Debug, Serialize)]
pub struct DeployAccepted {
    pub status: &'static str,
}

/// POST /api/v1/deploy
///
/// Starts the configured deploy command and returns 202 immediately. The
/// endpoint does not exist (404) unless `DEPLOY_SECRET` is set.
pub async fn trigger(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let Some(expected) = state
        .config
        .deploy
        .secret
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        return Err(AppError::Core(CoreError::NotFoundBySlug {
            entity: "Route",
            slug: "/deploy".into(),
        }));
    };

    let presented = headers
        .get(DEPLOY_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secret_matches(expected, presented) {
        tracing::warn!("Rejected deploy request with invalid secret");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid deploy secret".into(),
        )));
    }

    spawn_deploy(&state.config.deploy);

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: DeployAccepted { status: "deploying" },
        }),
    ))
}
