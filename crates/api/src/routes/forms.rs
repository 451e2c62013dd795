//! Route definitions for the `/forms` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::forms;
use crate::state::AppState;

/// Routes mounted at `/forms`.
///
/// ```text
/// GET    /                    -> list (admin)
/// POST   /                    -> create (admin)
/// POST   /payments/verify     -> verify_payment (auth)
/// GET    /{form}              -> get_by_slug
/// PUT    /{form}              -> update (admin)
/// DELETE /{form}              -> delete (admin)
/// GET    /{form}/submissions  -> list_submissions (admin)
/// POST   /{form}/submissions  -> submit (optional auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(forms::list).post(forms::create))
        .route("/payments/verify", post(forms::verify_payment))
        .route(
            "/{form}",
            get(forms::get_by_slug)
                .put(forms::update)
                .delete(forms::delete),
        )
        .route(
            "/{form}/submissions",
            get(forms::list_submissions).post(forms::submit),
        )
}
