use super::types::{Session, User};
use super::users::map_user_row;
use super::{SqliteStore, timestamp};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

impl SqliteStore {
    pub async fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = Session {
            token_hash: token_hash.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            expires_at,
        };

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token_hash)
        .bind(&session.user_id)
        .bind(timestamp(session.created_at))
        .bind(timestamp(session.expires_at))
        .execute(&self.pool)
        .await
        .context("insert session")?;

        Ok(session)
    }

    /// Resolve an unexpired session to its user.
    pub async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id AS id, u.name AS name, u.email AS email,
                    u.organization_id AS organization_id, u.created_at AS created_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = $1 AND s.expires_at > $2",
        )
        .bind(token_hash)
        .bind(timestamp(now))
        .fetch_optional(&self.pool)
        .await
        .context("query session user")?;

        row.map(|r| map_user_row(&r)).transpose()
    }

    pub async fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .context("delete session")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(timestamp(now))
            .execute(&self.pool)
            .await
            .context("purge expired sessions")?;
        Ok(result.rows_affected())
    }
}
