//! Role endpoints.

use uuid::Uuid;

use super::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{CreateRoleRequest, Role, UpdateRoleRequest};

impl ApiClient {
    /// GET /roles/ - List roles ordered by name.
    pub async fn list_roles(&self, ctx: &AuthContext) -> Result<Vec<Role>, AppError> {
        self.get_json(ctx, "/roles/").await
    }

    /// GET /roles/{id}
    pub async fn get_role(&self, ctx: &AuthContext, id: Uuid) -> Result<Role, AppError> {
        self.get_json(ctx, &format!("/roles/{}", id)).await
    }

    /// POST /roles/
    pub async fn create_role(
        &self,
        ctx: &AuthContext,
        request: &CreateRoleRequest,
    ) -> Result<Role, AppError> {
        self.post_json(ctx, "/roles/", request).await
    }

    /// PATCH /roles/{id}
    pub async fn update_role(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        request: &UpdateRoleRequest,
    ) -> Result<Role, AppError> {
        self.patch_json(ctx, &format!("/roles/{}", id), request).await
    }

    /// DELETE /roles/{id}
    pub async fn delete_role(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        self.delete(ctx, &format!("/roles/{}", id)).await
    }
}
