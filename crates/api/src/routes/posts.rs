//! Route definitions for the `/posts` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::posts;
use crate::state::AppState;

/// Routes mounted at `/posts`.
///
/// ```text
/// GET    /          -> list (?category=&tag=&limit=&offset=)
/// POST   /          -> create (admin)
/// GET    /{post}    -> get_by_slug
/// PUT    /{post}    -> update (admin)
/// DELETE /{post}    -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list).post(posts::create))
        .route(
            "/{post}",
            get(posts::get_by_slug).put(posts::update).delete(posts::delete),
        )
}
