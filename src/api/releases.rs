//! Release endpoints, including the deployment log mutations.

use uuid::Uuid;

use super::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{
    CreateReleaseRequest, Deployment, DeploymentRequest, Release, UpdateReleaseRequest,
};

impl ApiClient {
    /// GET /releases/ - List releases.
    pub async fn list_releases(&self, ctx: &AuthContext) -> Result<Vec<Release>, AppError> {
        self.get_json(ctx, "/releases/").await
    }

    /// GET /releases/{id} - Release with its service links and deployment log.
    pub async fn get_release(&self, ctx: &AuthContext, id: Uuid) -> Result<Release, AppError> {
        self.get_json(ctx, &format!("/releases/{}", id)).await
    }

    /// POST /releases/
    pub async fn create_release(
        &self,
        ctx: &AuthContext,
        request: &CreateReleaseRequest,
    ) -> Result<Release, AppError> {
        self.post_json(ctx, "/releases/", request).await
    }

    /// PATCH /releases/{id}
    pub async fn update_release(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        request: &UpdateReleaseRequest,
    ) -> Result<Release, AppError> {
        self.patch_json(ctx, &format!("/releases/{}", id), request)
            .await
    }

    /// DELETE /releases/{id}
    pub async fn delete_release(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        self.delete(ctx, &format!("/releases/{}", id)).await
    }

    /// POST /releases/{id}/deploy - Append a deployment record.
    pub async fn deploy(
        &self,
        ctx: &AuthContext,
        release_id: Uuid,
        request: &DeploymentRequest,
    ) -> Result<Deployment, AppError> {
        self.post_json(ctx, &format!("/releases/{}/deploy", release_id), request)
            .await
    }

    /// DELETE /releases/{id}/deploy/{env}/{service} - Remove every record for the pair.
    pub async fn undeploy(
        &self,
        ctx: &AuthContext,
        release_id: Uuid,
        environment_id: Uuid,
        service_id: Uuid,
    ) -> Result<(), AppError> {
        self.delete(
            ctx,
            &format!(
                "/releases/{}/deploy/{}/{}",
                release_id, environment_id, service_id
            ),
        )
        .await
    }

    /// GET /releases/{id}/report - PDF report bytes.
    pub async fn release_report(
        &self,
        ctx: &AuthContext,
        release_id: Uuid,
    ) -> Result<Vec<u8>, AppError> {
        self.get_bytes(ctx, &format!("/releases/{}/report", release_id))
            .await
    }
}
