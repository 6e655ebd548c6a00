//! Release detail view with deploy/undeploy commands.
//!
//! Every command follows the same shape: issue the mutation, then reload the
//! release from the API before anything is read again. Nothing is appended or
//! removed locally, so server-assigned fields (`id`, `deployed_at`) always
//! come from the API.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{Deployment, DeploymentRequest, Environment, Release};
use crate::progress::{self, Progress};

/// Loaded release plus the environments it is tracked against.
pub struct ReleaseView {
    client: ApiClient,
    ctx: AuthContext,
    release_id: Uuid,
    release: RwLock<Release>,
    environments: Vec<Environment>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the command finishes, however it finishes.
pub(crate) struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl ReleaseView {
    /// Fetch the release and the environment list.
    ///
    /// A failing environment list (other than a rejected session) leaves the
    /// view with no environments instead of failing the load; see
    /// [`load_environments`].
    pub async fn load(
        client: ApiClient,
        ctx: AuthContext,
        release_id: Uuid,
    ) -> Result<Self, AppError> {
        let release = fetch_release(&client, &ctx, release_id).await?;
        let environments = load_environments(&client, &ctx).await?;

        Ok(Self {
            client,
            ctx,
            release_id,
            release: RwLock::new(release),
            environments,
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn release_id(&self) -> Uuid {
        self.release_id
    }

    /// Copy of the release as last fetched.
    pub async fn release(&self) -> Release {
        self.release.read().await.clone()
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    /// Whether a deploy/undeploy is currently running on this view.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn progress(&self, environment_id: Uuid) -> Progress {
        progress::progress(&*self.release.read().await, environment_id)
    }

    pub async fn service_status(
        &self,
        environment_id: Uuid,
        service_id: Uuid,
    ) -> Option<Deployment> {
        let release = self.release.read().await;
        progress::service_status(&release, environment_id, service_id).cloned()
    }

    /// Reload the release from the API.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let fresh = fetch_release(&self.client, &self.ctx, self.release_id).await?;
        *self.release.write().await = fresh;
        Ok(())
    }

    /// Record a successful deployment of `service_id` to `environment_id`,
    /// then reload the release.
    pub async fn deploy(
        &self,
        environment_id: Uuid,
        service_id: Uuid,
    ) -> Result<Deployment, AppError> {
        let _guard = self.begin()?;
        tracing::info!(
            release = %self.release_id,
            environment = %environment_id,
            service = %service_id,
            "Deploying service"
        );

        let request = DeploymentRequest::success(environment_id, service_id);
        let deployment = self
            .client
            .deploy(&self.ctx, self.release_id, &request)
            .await
            .inspect_err(|e| tracing::warn!("Deploy failed: {}", e))?;

        self.refresh().await.inspect_err(|e| {
            tracing::warn!(
                deployment = %deployment.id,
                "Deploy recorded but reloading the release failed: {}",
                e
            )
        })?;
        tracing::info!(deployment = %deployment.id, "Deploy recorded");
        Ok(deployment)
    }

    /// Remove every deployment record of `service_id` in `environment_id`,
    /// then reload the release.
    pub async fn undeploy(&self, environment_id: Uuid, service_id: Uuid) -> Result<(), AppError> {
        let _guard = self.begin()?;
        tracing::info!(
            release = %self.release_id,
            environment = %environment_id,
            service = %service_id,
            "Undeploying service"
        );

        self.client
            .undeploy(&self.ctx, self.release_id, environment_id, service_id)
            .await
            .inspect_err(|e| tracing::warn!("Undeploy failed: {}", e))?;

        self.refresh().await.inspect_err(|e| {
            tracing::warn!("Undeploy recorded but reloading the release failed: {}", e)
        })?;
        tracing::info!("Undeploy recorded");
        Ok(())
    }

    /// Download the PDF report into `dir`, returning the written path.
    pub async fn download_report(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let bytes = self
            .client
            .release_report(&self.ctx, self.release_id)
            .await?;
        let path = dir.join(report_file_name(&*self.release.read().await));
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        client: ApiClient,
        ctx: AuthContext,
        release: Release,
        environments: Vec<Environment>,
    ) -> Self {
        Self {
            client,
            ctx,
            release_id: release.id,
            release: RwLock::new(release),
            environments,
            in_flight: AtomicBool::new(false),
        }
    }

    pub(crate) fn begin(&self) -> Result<InFlight<'_>, AppError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::Busy)?;
        Ok(InFlight {
            flag: &self.in_flight,
        })
    }
}

/// Fetch the environment list for display.
///
/// A rejected session propagates; any other failure is logged and yields an
/// empty list.
pub async fn load_environments(
    client: &ApiClient,
    ctx: &AuthContext,
) -> Result<Vec<Environment>, AppError> {
    match client.list_environments(ctx).await {
        Ok(environments) => Ok(environments),
        Err(e @ AppError::Unauthorized(_)) => Err(e),
        Err(e) => {
            tracing::warn!("Failed to load environments: {}", e);
            Ok(Vec::new())
        }
    }
}

async fn fetch_release(
    client: &ApiClient,
    ctx: &AuthContext,
    release_id: Uuid,
) -> Result<Release, AppError> {
    client
        .get_release(ctx, release_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Release not found".to_string()),
            other => other,
        })
}

/// File name for a release's PDF report: `release_report_<name>_<version>.pdf`,
/// with each whitespace run in the name replaced by `_`.
pub fn report_file_name(release: &Release) -> String {
    let mut name = String::with_capacity(release.name.len());
    let mut in_space = false;
    for c in release.name.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            in_space = false;
            name.push(if c == '/' || c == '\\' { '_' } else { c });
        }
    }
    let version = release.version.replace(['/', '\\'], "_");
    format!("release_report_{}_{}.pdf", name, version)
}
