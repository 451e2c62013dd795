//! Route definitions for course payments at `/payments`.

use axum::routing::post;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST /verify   -> verify (auth)
/// POST /webhook  -> webhook (signed by the gateway)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", post(payments::verify))
        .route("/webhook", post(payments::webhook))
}
