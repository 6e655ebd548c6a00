//! User endpoints.

use uuid::Uuid;

use super::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{CreateUserRequest, UpdateUserRequest, User};

impl ApiClient {
    /// GET /users/ - List users (requires `read:users`).
    pub async fn list_users(&self, ctx: &AuthContext) -> Result<Vec<User>, AppError> {
        self.get_json(ctx, "/users/").await
    }

    /// GET /users/{id}
    pub async fn get_user(&self, ctx: &AuthContext, id: Uuid) -> Result<User, AppError> {
        self.get_json(ctx, &format!("/users/{}", id)).await
    }

    /// POST /users/
    pub async fn create_user(
        &self,
        ctx: &AuthContext,
        request: &CreateUserRequest,
    ) -> Result<User, AppError> {
        self.post_json(ctx, "/users/", request).await
    }

    /// PATCH /users/{id}
    pub async fn update_user(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        request: &UpdateUserRequest,
    ) -> Result<User, AppError> {
        self.patch_json(ctx, &format!("/users/{}", id), request).await
    }

    /// DELETE /users/{id}
    pub async fn delete_user(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        self.delete(ctx, &format!("/users/{}", id)).await
    }
}
