//! Route definitions for the `/topics` resource and nested lessons.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{lessons, topics};
use crate::state::AppState;

/// Routes mounted at `/topics`.
///
/// ```text
/// PUT    /{topic}                  -> topics::update (admin)
/// DELETE /{topic}                  -> topics::delete (admin)
/// GET    /{topic}/lessons          -> lessons::list_by_topic (admin)
/// POST   /{topic}/lessons          -> lessons::create (admin)
/// PUT    /{topic}/lessons/reorder  -> lessons::reorder (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{topic}", put(topics::update).delete(topics::delete))
        .route(
            "/{topic}/lessons",
            get(lessons::list_by_topic).post(lessons::create),
        )
        .route("/{topic}/lessons/reorder", put(lessons::reorder))
}
