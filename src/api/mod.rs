//! REST API client.
//!
//! One submodule per API resource, all sharing the request plumbing below.
//! Every authenticated call takes the session's [`AuthContext`] explicitly.

mod auth;
mod environments;
mod releases;
mod roles;
mod services;
mod users;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::AuthContext;
use crate::errors::AppError;

const USER_AGENT: &str = concat!("releaserite/", env!("CARGO_PKG_VERSION"));

/// Client for the ReleaseRite REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for the API rooted at `base_url` (e.g. `http://host/api/v1`).
    pub fn new(base_url: Url) -> Result<Self, AppError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Start an authenticated request.
    fn request(
        &self,
        ctx: &AuthContext,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, AppError> {
        if ctx.is_invalidated() {
            return Err(AppError::Unauthorized(
                "Session expired; please log in again.".to_string(),
            ));
        }
        tracing::debug!("{} {}", method, path);
        Ok(self
            .http
            .request(method, self.url(path))
            .header(AUTHORIZATION, ctx.bearer())
            .header(ACCEPT, "application/json"))
    }

    /// Send a request and return the raw body of a success response.
    async fn execute(
        &self,
        ctx: Option<&AuthContext>,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), AppError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if status.is_success() {
            return Ok((status, body));
        }

        if status == StatusCode::UNAUTHORIZED {
            if let Some(ctx) = ctx {
                tracing::warn!("API rejected the session token; invalidating session");
                ctx.invalidate();
            }
        }
        Err(AppError::from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        ctx: &AuthContext,
        request: RequestBuilder,
    ) -> Result<T, AppError> {
        let (_, body) = self.execute(Some(ctx), request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &AuthContext,
        path: &str,
    ) -> Result<T, AppError> {
        let request = self.request(ctx, Method::GET, path)?;
        self.send_json(ctx, request).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &AuthContext,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let request = self.request(ctx, Method::POST, path)?.json(body);
        self.send_json(ctx, request).await
    }

    async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &AuthContext,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let request = self.request(ctx, Method::PATCH, path)?.json(body);
        self.send_json(ctx, request).await
    }

    /// DELETE; any success status counts, the body is ignored.
    async fn delete(&self, ctx: &AuthContext, path: &str) -> Result<(), AppError> {
        let request = self.request(ctx, Method::DELETE, path)?;
        self.execute(Some(ctx), request).await?;
        Ok(())
    }

    async fn get_bytes(&self, ctx: &AuthContext, path: &str) -> Result<Vec<u8>, AppError> {
        let request = self.request(ctx, Method::GET, path)?;
        let (_, body) = self.execute(Some(ctx), request).await?;
        Ok(body)
    }
}
