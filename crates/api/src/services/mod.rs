//! Adapters for external systems.
//!
//! - [`storage`] -- S3-compatible object storage behind [`storage::ObjectStorage`].
//! - [`gateway`] -- Razorpay orders API behind [`gateway::PaymentGateway`].
//! - [`deploy`] -- Background runner for the deployment hook command.

pub mod deploy;
pub mod gateway;
pub mod storage;
