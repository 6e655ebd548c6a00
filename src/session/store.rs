//! Key/value credential store.

use std::path::Path;

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::init_session_db;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{default_token_type, Token};

/// Key holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key holding the token type.
pub const TOKEN_TYPE_KEY: &str = "token_type";

/// Stored credentials for the current user.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the store at `path`.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        let pool = init_session_db(path).await?;
        Ok(Self::new(pool))
    }

    /// Replace the stored credentials with `token`.
    pub async fn save(&self, token: &Token) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for (key, value) in [
            (ACCESS_TOKEN_KEY, token.access_token.as_str()),
            (TOKEN_TYPE_KEY, token.token_type.as_str()),
        ] {
            sqlx::query(
                "INSERT INTO session (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::debug!("Stored session credentials");
        Ok(())
    }

    /// Load the stored credentials, if any.
    pub async fn load(&self) -> Result<Option<AuthContext>, AppError> {
        let Some(token) = self.get(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };
        if token.is_empty() {
            return Ok(None);
        }
        let token_type = self
            .get(TOKEN_TYPE_KEY)
            .await?
            .unwrap_or_else(default_token_type);
        Ok(Some(AuthContext::new(token, token_type)))
    }

    /// Load the stored credentials or fail with [`AppError::NotLoggedIn`].
    pub async fn require(&self) -> Result<AuthContext, AppError> {
        self.load().await?.ok_or(AppError::NotLoggedIn)
    }

    /// Forget the stored credentials.
    pub async fn clear(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM session WHERE key IN (?, ?)")
            .bind(ACCESS_TOKEN_KEY)
            .bind(TOKEN_TYPE_KEY)
            .execute(&self.pool)
            .await?;
        tracing::debug!("Cleared session credentials");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM session WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }
}
