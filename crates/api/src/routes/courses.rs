//! Route definitions for the `/courses` resource and its nested topics and
//! enrollment endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{courses, enrollment, topics};
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// `{course}` is a slug for the public reads and an id everywhere else.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create (admin)
/// GET    /{course}                  -> get_by_slug
/// PUT    /{course}                  -> update (admin)
/// DELETE /{course}                  -> delete (admin)
/// GET    /{course}/curriculum       -> curriculum
/// GET    /{course}/topics           -> topics::list_by_course
/// POST   /{course}/topics           -> topics::create (admin)
/// PUT    /{course}/topics/reorder   -> topics::reorder (admin)
/// POST   /{course}/purchase         -> enrollment::purchase (auth)
/// GET    /{course}/enrollment       -> enrollment::enrollment_status (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(courses::list).post(courses::create))
        .route(
            "/{course}",
            get(courses::get_by_slug)
                .put(courses::update)
                .delete(courses::delete),
        )
        .route("/{course}/curriculum", get(courses::curriculum))
        .route(
            "/{course}/topics",
            get(topics::list_by_course).post(topics::create),
        )
        .route("/{course}/topics/reorder", put(topics::reorder))
        .route("/{course}/purchase", post(enrollment::purchase))
        .route("/{course}/enrollment", get(enrollment::enrollment_status))
}
