//! Service endpoints.

use uuid::Uuid;

use super::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{CreateServiceRequest, Service, UpdateServiceRequest};

impl ApiClient {
    /// GET /service/ - List services.
    pub async fn list_services(&self, ctx: &AuthContext) -> Result<Vec<Service>, AppError> {
        self.get_json(ctx, "/service/").await
    }

    /// GET /service/{id}
    pub async fn get_service(&self, ctx: &AuthContext, id: Uuid) -> Result<Service, AppError> {
        self.get_json(ctx, &format!("/service/{}", id)).await
    }

    /// POST /service/
    pub async fn create_service(
        &self,
        ctx: &AuthContext,
        request: &CreateServiceRequest,
    ) -> Result<Service, AppError> {
        self.post_json(ctx, "/service/", request).await
    }

    /// PATCH /service/{id}
    pub async fn update_service(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        request: &UpdateServiceRequest,
    ) -> Result<Service, AppError> {
        self.patch_json(ctx, &format!("/service/{}", id), request)
            .await
    }

    /// DELETE /service/{id}
    pub async fn delete_service(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        self.delete(ctx, &format!("/service/{}", id)).await
    }
}
