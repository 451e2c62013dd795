//! Session tokens.
//!
//! A sign-in issues a [`TokenPair`]: a short-lived HS256 access token carrying
//! [`Claims`] and an opaque refresh token. Only the refresh token's SHA-256
//! digest is stored; refreshing revokes the stored session and issues a new
//! pair.

use chrono::{Duration, Utc};
use eduportal_core::types::{DbId, Timestamp};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Claims of an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Signing secret and token lifetimes. Loaded by `ServerConfig::from_env`.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_mins: i64,
    pub refresh_ttl_days: i64,
}

/// Tokens handed to a client after register, login or refresh.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    /// Seconds until `access_token` expires.
    pub access_expires_in: i64,
    /// Plaintext refresh token; never stored.
    pub refresh_token: String,
    pub refresh_digest: String,
    pub refresh_expires_at: Timestamp,
}

/// Issue a fresh access/refresh pair for a user.
pub fn issue_tokens(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let access_ttl = Duration::minutes(config.access_ttl_mins);

    let claims = Claims {
        sub: user_id,
        role: role.to_owned(),
        iat: now.timestamp(),
        exp: (now + access_ttl).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let access_token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    let refresh_token = Uuid::new_v4().simple().to_string();
    Ok(TokenPair {
        access_token,
        access_expires_in: access_ttl.num_seconds(),
        refresh_digest: refresh_digest(&refresh_token),
        refresh_token,
        refresh_expires_at: now + Duration::days(config.refresh_ttl_days),
    })
}

/// Check an access token's signature and expiry.
pub fn decode_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Hex SHA-256 of a refresh token, as stored in `user_sessions`.
pub fn refresh_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
