//! Environment endpoints.

use uuid::Uuid;

use super::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{CreateEnvironmentRequest, Environment, UpdateEnvironmentRequest};

impl ApiClient {
    /// GET /environment/ - List environments in API order.
    pub async fn list_environments(&self, ctx: &AuthContext) -> Result<Vec<Environment>, AppError> {
        self.get_json(ctx, "/environment/").await
    }

    /// GET /environment/{id}
    pub async fn get_environment(
        &self,
        ctx: &AuthContext,
        id: Uuid,
    ) -> Result<Environment, AppError> {
        self.get_json(ctx, &format!("/environment/{}", id)).await
    }

    /// POST /environment/
    pub async fn create_environment(
        &self,
        ctx: &AuthContext,
        request: &CreateEnvironmentRequest,
    ) -> Result<Environment, AppError> {
        self.post_json(ctx, "/environment/", request).await
    }

    /// PATCH /environment/{id}
    pub async fn update_environment(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        request: &UpdateEnvironmentRequest,
    ) -> Result<Environment, AppError> {
        self.patch_json(ctx, &format!("/environment/{}", id), request)
            .await
    }

    /// DELETE /environment/{id}
    pub async fn delete_environment(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        self.delete(ctx, &format!("/environment/{}", id)).await
    }
}
