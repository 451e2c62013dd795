//! Route definitions for the `/tags` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Routes mounted at `/tags`.
///
/// ```text
/// GET    /        -> list
/// POST   /        -> create (admin)
/// GET    /{tag}   -> get_by_slug
/// PUT    /{tag}   -> update (admin)
/// DELETE /{tag}   -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::list).post(tags::create))
        .route(
            "/{tag}",
            get(tags::get_by_slug).put(tags::update).delete(tags::delete),
        )
}
