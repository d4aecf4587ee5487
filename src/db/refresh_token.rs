//! Authoritative refresh-token storage.
//!
//! One row per identity, keyed by `"RT:" + subject`, with an absolute expiry
//! giving TTL-on-write semantics. Only refresh tokens are stored; access
//! tokens are stateless and never touch the database.

use sqlx::sqlite::SqlitePool;
use std::time::Duration;

/// Store holding the single authoritative refresh token per identity.
pub struct RefreshTokenStore {
    pool: SqlitePool,
}

/// Logical revocation key for a subject.
fn storage_key(subject: &str) -> String {
    format!("RT:{}", subject)
}

/// SQLite datetime modifier for "now + ttl".
fn ttl_modifier(ttl: Duration) -> String {
    format!("+{} seconds", ttl.as_secs())
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store the refresh token for a subject, unconditionally overwriting any
    /// existing record and resetting its expiry. A single upsert statement:
    /// concurrent writers for the same identity cannot interleave partial
    /// writes.
    pub async fn put(&self, subject: &str, token: &str, ttl: Duration) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO refresh_tokens (key, token, expires_at) VALUES (?, ?, datetime('now', ?))
             ON CONFLICT(key) DO UPDATE SET token = excluded.token, expires_at = excluded.expires_at",
        )
        .bind(storage_key(subject))
        .bind(token)
        .bind(ttl_modifier(ttl))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the current authoritative token for a subject.
    /// Expired rows read as absent even before the reaper removes them.
    pub async fn get(&self, subject: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT token FROM refresh_tokens WHERE key = ? AND expires_at > datetime('now')",
        )
        .bind(storage_key(subject))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(token,)| token))
    }

    /// Replace the stored token for a subject only if the live value exactly
    /// equals `expected` and has not expired. Returns whether the swap took
    /// effect.
    ///
    /// The compare and the overwrite are one UPDATE statement, so two rotations
    /// racing with the same presented token cannot both succeed; the loser sees
    /// the winner's new token in the row and matches nothing.
    pub async fn swap_if_matches(
        &self,
        subject: &str,
        expected: &str,
        replacement: &str,
        ttl: Duration,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET token = ?, expires_at = datetime('now', ?)
             WHERE key = ? AND token = ? AND expires_at > datetime('now')",
        )
        .bind(replacement)
        .bind(ttl_modifier(ttl))
        .bind(storage_key(subject))
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all expired records.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
