//! Blacklisted JWT tokens repository.
//!
//! Logout inserts the token's jti; the overdue sweep tick prunes rows past
//! their expiry so the table stays bounded.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{clock::SharedClock, error::AppResult};

#[derive(Clone)]
pub struct TokensRepository {
    pool: Pool<Postgres>,
    clock: SharedClock,
}

impl TokensRepository {
    pub fn new(pool: Pool<Postgres>, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Blacklist a token id until its expiry
    pub async fn blacklist(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blacklisted_tokens (id, jti, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(jti)
        .bind(expires_at)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Check whether a token id has been blacklisted
    pub async fn is_blacklisted(&self, jti: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blacklisted_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Remove expired entries. Returns the count deleted.
    pub async fn prune_expired(&self) -> AppResult<u64> {
        let deleted = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < $1")
            .bind(self.clock.now())
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected())
    }
}
