//! Route definitions for the `/carousel` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::carousel;
use crate::state::AppState;

/// Routes mounted at `/carousel`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create (admin, multipart)
/// GET    /active         -> get_active
/// PUT    /{id}           -> update (admin)
/// DELETE /{id}           -> delete (admin)
/// POST   /{id}/activate  -> activate (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(carousel::list).post(carousel::create))
        .route("/active", get(carousel::get_active))
        .route("/{id}", put(carousel::update).delete(carousel::delete))
        .route("/{id}/activate", post(carousel::activate))
}
