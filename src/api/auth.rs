//! Authentication endpoints.

use reqwest::header::ACCEPT;

use super::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{Token, User};

impl ApiClient {
    /// POST /auth/login - OAuth2 password grant; the email goes in `username`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Token, AppError> {
        tracing::debug!("POST /auth/login");
        let request = self
            .http
            .post(self.url("/auth/login"))
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "password"),
                ("username", email),
                ("password", password),
                ("scope", ""),
                ("client_id", ""),
                ("client_secret", ""),
            ]);
        let (_, body) = self.execute(None, request).await?;
        let token: Token = serde_json::from_slice(&body)?;
        if token.access_token.is_empty() {
            return Err(AppError::Decode(
                "no access token returned from API".to_string(),
            ));
        }
        Ok(token)
    }

    /// GET /auth/me - The user the token belongs to.
    pub async fn me(&self, ctx: &AuthContext) -> Result<User, AppError> {
        self.get_json(ctx, "/auth/me").await
    }

    /// Admin dashboard figures: the total user count, fetched only for admins.
    pub async fn dashboard_summary(&self, ctx: &AuthContext) -> Result<Option<usize>, AppError> {
        if !ctx.claims().is_some_and(|claims| claims.is_admin()) {
            return Ok(None);
        }
        let users = self.list_users(ctx).await?;
        Ok(Some(users.len()))
    }
}
