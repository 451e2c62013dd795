//! Education portal API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! storage and gateway adapters) so integration tests and the binary
//! entrypoint share them.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;
