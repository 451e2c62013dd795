//! Route definitions for the `/categories` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// `{category}` is a slug for GET and an id for PUT/DELETE.
///
/// ```text
/// GET    /            -> list
/// POST   /            -> create (admin)
/// GET    /{category}  -> get_by_slug
/// PUT    /{category}  -> update (admin)
/// DELETE /{category}  -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{category}",
            get(categories::get_by_slug)
                .put(categories::update)
                .delete(categories::delete),
        )
}
