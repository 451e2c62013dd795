//! Accounts in `users`. Emails are stored trimmed and lowercased.

use eduportal_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{NewUser, User};

const USER_SELECT: &str = "SELECT id, name, email, password_hash, role, is_active, \
                           last_login_at, created_at, updated_at FROM users";

pub struct UserRepo;

impl UserRepo {
    /// Insert an account. A taken email violates `uq_users_email`.
    pub async fn create(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(user.name.trim())
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(pool)
        .await?;

        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    pub async fn touch_last_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map(|_| ())
    }

    /// Returns `false` when no such user exists.
    pub async fn set_role(pool: &PgPool, id: DbId, role: &str) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
