//! Refresh-token sessions in `user_sessions`.
//!
//! Only the digest of a refresh token is stored. A token is single-use:
//! [`SessionRepo::redeem`] revokes it in the same statement that reads it.

use eduportal_core::types::{DbId, Timestamp};
use sqlx::PgPool;

pub struct SessionRepo;

impl SessionRepo {
    /// Record a newly issued refresh token. Returns the session id.
    pub async fn open(
        pool: &PgPool,
        user_id: DbId,
        token_digest: &str,
        expires_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(user_id)
        .bind(token_digest)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Consume a live refresh token and return its owner.
    ///
    /// `None` when the digest is unknown, expired or already used. Of two
    /// concurrent redeems only one sees the row.
    pub async fn redeem(pool: &PgPool, token_digest: &str) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE user_sessions SET is_revoked = true
             WHERE refresh_token_hash = $1
               AND NOT is_revoked
               AND expires_at > NOW()
             RETURNING user_id",
        )
        .bind(token_digest)
        .fetch_optional(pool)
        .await
    }

    /// Revoke every live session of a user; returns how many were revoked.
    pub async fn close_all(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE user_id = $1 AND NOT is_revoked",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(done.rows_affected())
    }
}
