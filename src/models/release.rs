//! Release model: a versioned bundle of services and its deployment log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{timestamp, Service, UserSummary};

/// Deployment status recorded by a successful deploy.
pub const DEPLOYMENT_SUCCESS: &str = "success";

/// One event in a release's deployment log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub id: Uuid,
    pub release_id: Uuid,
    pub environment_id: Uuid,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    pub status: String,
    #[serde(with = "timestamp")]
    pub deployed_at: DateTime<Utc>,
}

impl Deployment {
    pub fn is_success(&self) -> bool {
        self.status == DEPLOYMENT_SUCCESS
    }
}

/// Request body for `POST /releases/{id}/deploy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRequest {
    pub environment_id: Uuid,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    pub status: String,
}

impl DeploymentRequest {
    /// A deployment of one service, recorded as successful.
    pub fn success(environment_id: Uuid, service_id: Uuid) -> Self {
        Self {
            environment_id,
            service_id: Some(service_id),
            status: DEPLOYMENT_SUCCESS.to_string(),
        }
    }
}

/// Declares that a service is part of a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseServiceLink {
    pub service_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub service: Service,
}

/// A service link as sent when creating or editing a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceLinkRequest {
    pub service_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A release with its service links and deployment log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub planned_release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_owner: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_analyst: Option<UserSummary>,
    #[serde(default)]
    pub service_links: Vec<ReleaseServiceLink>,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

impl Release {
    /// Look up the service link for `service_id`.
    pub fn service_link(&self, service_id: Uuid) -> Option<&ReleaseServiceLink> {
        self.service_links
            .iter()
            .find(|link| link.service_id == service_id)
    }
}

/// Request body for creating a new release.
#[derive(Debug, Clone, Serialize)]
pub struct CreateReleaseRequest {
    pub name: String,
    pub version: String,
    #[serde(
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub planned_release_date: Option<DateTime<Utc>>,
    pub services: Vec<ServiceLinkRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_owner_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_analyst_id: Option<Uuid>,
}

/// Request body for updating a release. Unset fields are left untouched;
/// a present `services` list replaces all existing links.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReleaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub planned_release_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_owner_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_analyst_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ServiceLinkRequest>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_release_from_api_json() {
        let service_id = Uuid::new_v4();
        let env_id = Uuid::new_v4();
        let release_id = Uuid::new_v4();
        let doc = json!({
            "id": release_id,
            "name": "Release-2024.01",
            "version": "v1.0.0",
            "created_at": "2024-01-10T09:15:00.000123",
            "planned_release_date": null,
            "owner_id": null,
            "owner": {"id": Uuid::new_v4(), "email": "owner@example.com", "full_name": null},
            "service_links": [{
                "service_id": service_id,
                "pipeline_link": "https://ci.example.com/p/1",
                "version": "2.3.1",
                "service": {
                    "id": service_id,
                    "name": "Ingestion Service",
                    "status": "active",
                    "created_at": "2024-01-01T00:00:00",
                    "updated_at": "2024-01-01T00:00:00"
                }
            }],
            "deployments": [{
                "id": Uuid::new_v4(),
                "release_id": release_id,
                "environment_id": env_id,
                "service_id": service_id,
                "status": "success",
                "deployed_at": "2024-01-11T08:00:00"
            }]
        });

        let release: Release = serde_json::from_value(doc).unwrap();
        assert_eq!(release.service_links.len(), 1);
        assert_eq!(release.deployments[0].service_id, Some(service_id));
        assert!(release.deployments[0].is_success());
        assert_eq!(
            release.owner.as_ref().map(|o| o.display_name()),
            Some("owner@example.com")
        );
        assert!(release.service_link(service_id).is_some());
        assert!(release.service_link(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_deploy_request_is_always_success() {
        let env = Uuid::new_v4();
        let svc = Uuid::new_v4();
        let body = serde_json::to_value(DeploymentRequest::success(env, svc)).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["environment_id"], json!(env));
        assert_eq!(body["service_id"], json!(svc));
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = UpdateReleaseRequest {
            version: Some("v1.0.1".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"version": "v1.0.1"})
        );
    }
}
