//! Route definitions for the `/lessons` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::lessons;
use crate::state::AppState;

/// Routes mounted at `/lessons`.
///
/// ```text
/// GET    /{id} -> get_lesson (auth, content gated by enrollment)
/// PUT    /{id} -> update (admin)
/// DELETE /{id} -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(lessons::get_lesson)
            .put(lessons::update)
            .delete(lessons::delete),
    )
}
