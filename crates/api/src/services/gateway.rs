//! Razorpay orders API client.
//!
//! Only order creation happens server-side; the browser checkout completes
//! the payment and the result is verified by signature (see
//! `eduportal_core::payment`).

use std::time::Duration;

use async_trait::async_trait;
use eduportal_core::types::MinorUnits;
use serde::{Deserialize, Serialize};

use crate::config::RazorpayConfig;

/// HTTP request timeout for gateway calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Credentials are missing; paid checkouts cannot be created.
    #[error("Payment gateway is not configured")]
    NotConfigured,

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Payment gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Payment gateway error ({status}): {body}")]
    Api { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Order to create at the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Amount in minor units (paise).
    pub amount: MinorUnits,
    pub currency: String,
    /// Merchant reference, max 40 chars.
    pub receipt: String,
    /// Free-form key/value notes stored with the order.
    pub notes: serde_json::Value,
}

/// Order as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: MinorUnits,
    pub currency: String,
}

/// Creates checkout orders.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;
}

// ---------------------------------------------------------------------------
// Razorpay
// ---------------------------------------------------------------------------

/// [`PaymentGateway`] talking to `POST {base_url}/v1/orders` with basic auth.
pub struct RazorpayClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(config: &RazorpayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        if self.key_id.is_empty() || self.key_secret.is_empty() {
            return Err(GatewayError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<GatewayOrder>().await?)
    }
}
