//! Route definitions for the `/deploy` hook.

use axum::routing::post;
use axum::Router;

use crate::handlers::deploy;
use crate::state::AppState;

/// Routes mounted at `/deploy`.
///
/// ```text
/// POST / -> trigger (X-Deploy-Secret)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(deploy::trigger))
}
