//! Route definitions for the `/files` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// Routes mounted at `/files`.
///
/// ```text
/// GET    /                   -> list
/// POST   /                   -> create (admin, multipart)
/// GET    /purchased          -> purchased (auth)
/// POST   /purchase           -> purchase (auth)
/// POST   /verify-payment     -> verify_payment (auth)
/// GET    /{file}             -> get_by_slug
/// PUT    /{file}             -> update (admin)
/// DELETE /{file}             -> delete (admin)
/// GET    /{file}/download    -> download (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(files::list).post(files::create))
        .route("/purchased", get(files::purchased))
        .route("/purchase", post(files::purchase))
        .route("/verify-payment", post(files::verify_payment))
        .route(
            "/{file}",
            get(files::get_by_slug)
                .put(files::update)
                .delete(files::delete),
        )
        .route("/{file}/download", get(files::download))
}
