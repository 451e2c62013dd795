//! Route definitions for the caller's own resources at `/me`.

use axum::routing::get;
use axum::Router;

use crate::handlers::enrollment;
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET /enrollments -> my_enrollments (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/enrollments", get(enrollment::my_enrollments))
}
