use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::gateway::PaymentGateway;
use crate::services::storage::ObjectStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and everything else sits
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: eduportal_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Object storage for uploads and downloads.
    pub storage: Arc<dyn ObjectStorage>,
    /// Payment gateway used to open checkout orders.
    pub gateway: Arc<dyn PaymentGateway>,
}
