//! Payment gateway signatures, pricing and receipt helpers.
//!
//! The gateway signs a completed checkout with
//! `HMAC-SHA256(key_secret, "{order_id}|{payment_id}")` and signs webhook
//! deliveries with `HMAC-SHA256(webhook_secret, raw_body)`, both hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CoreError;
use crate::status::PricingModel;
use crate::types::MinorUnits;

type HmacSha256 = Hmac<Sha256>;

/// Smallest order amount the gateway accepts (1 INR).
pub const MIN_ORDER_AMOUNT: MinorUnits = 100;

/// Gateway limit on the length of a receipt string.
pub const MAX_RECEIPT_LEN: usize = 40;

/// Default currency for prices.
pub const DEFAULT_CURRENCY: &str = "INR";

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Compute the hex checkout signature for an order/payment pair.
pub fn compute_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = mac_for(secret);
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a checkout signature in constant time.
///
/// A signature that is not valid hex never matches.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Some(expected) = hex::decode(signature) else {
        return false;
    };
    let mut mac = mac_for(secret);
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Compute the hex webhook signature of a raw request body.
pub fn compute_webhook_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = mac_for(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook signature over the raw request body in constant time.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(expected) = hex::decode(signature) else {
        return false;
    };
    let mut mac = mac_for(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// The amount a buyer pays.
///
/// Free assets cost nothing. A sale price applies only when it undercuts the
/// list price.
pub fn effective_price(
    model: PricingModel,
    price: MinorUnits,
    sale_price: Option<MinorUnits>,
) -> MinorUnits {
    match model {
        PricingModel::Free => 0,
        PricingModel::Paid => match sale_price {
            Some(sale) if sale < price => sale,
            _ => price,
        },
    }
}

/// Validate the price fields of a paid or free asset.
pub fn validate_pricing(
    model: PricingModel,
    price: MinorUnits,
    sale_price: Option<MinorUnits>,
) -> Result<(), CoreError> {
    match model {
        PricingModel::Free => {
            if price != 0 || sale_price.is_some_and(|s| s != 0) {
                return Err(CoreError::Validation(
                    "Free items cannot carry a price".into(),
                ));
            }
        }
        PricingModel::Paid => {
            if price < MIN_ORDER_AMOUNT {
                return Err(CoreError::Validation(format!(
                    "Paid price must be at least {MIN_ORDER_AMOUNT} minor units"
                )));
            }
            if let Some(sale) = sale_price {
                if sale < MIN_ORDER_AMOUNT || sale > price {
                    return Err(CoreError::Validation(format!(
                        "Sale price must be between {MIN_ORDER_AMOUNT} and the list price"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Validate a flat fee (files, forms) where zero means free.
pub fn validate_fee(fee: MinorUnits) -> Result<(), CoreError> {
    if fee == 0 || fee >= MIN_ORDER_AMOUNT {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Fee must be 0 (free) or at least {MIN_ORDER_AMOUNT} minor units"
        )))
    }
}

/// Build a gateway receipt string such as `course_12_7_3f9a1c2e`.
///
/// The trailing `nonce` keeps receipts unique across retried checkouts.
pub fn make_receipt(prefix: &str, user_id: i64, asset_id: i64, nonce: &str) -> String {
    let mut receipt = format!("{prefix}_{user_id}_{asset_id}_{nonce}");
    receipt.truncate(MAX_RECEIPT_LEN);
    receipt
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string (either case). Returns `None` on odd length or
    /// non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        s.as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16)?;
                let lo = (pair[1] as char).to_digit(16)?;
                Some((hi * 16 + lo) as u8)
            })
            .collect()
    }
}
