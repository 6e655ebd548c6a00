//! Deployment progress of a release across environments.
//!
//! Everything here is a pure function of a [`Release`] snapshot (and, for the
//! views, the environment list). A service counts as deployed to an
//! environment when the release's log holds at least one `success` record for
//! that pair; the latest such record is its current deployment.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{Deployment, Environment, Release, ReleaseServiceLink};

/// Deployment progress of one release in one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Linked services with a successful deployment in the environment
    pub deployed: usize,
    /// Distinct services linked to the release
    pub total: usize,
    /// `deployed / total` as a percentage, rounded half up, then clamped so
    /// 100 means complete and 0 means nothing deployed
    pub percent: u32,
}

impl Progress {
    pub const EMPTY: Progress = Progress {
        deployed: 0,
        total: 0,
        percent: 0,
    };

    pub fn tier(&self) -> ProgressTier {
        ProgressTier::from_percent(self.percent)
    }
}

/// Display tier of a progress percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressTier {
    /// Nothing deployed
    None,
    /// Some but not all services deployed
    Partial,
    /// Every service deployed
    Full,
}

impl ProgressTier {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            0 => ProgressTier::None,
            p if p >= 100 => ProgressTier::Full,
            _ => ProgressTier::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressTier::None => "none",
            ProgressTier::Partial => "partial",
            ProgressTier::Full => "full",
        }
    }
}

/// Round `part / whole * 100` half up, in integer arithmetic.
///
/// Returns 0 when `whole` is 0. The result is 100 only when `part == whole`
/// and 0 only when `part == 0`, so large releases never round into the
/// wrong tier.
pub fn percent_of(part: usize, whole: usize) -> u32 {
    if whole == 0 || part == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    let rounded = ((part * 200 + whole) / (whole * 2)) as u32;
    if part < whole {
        rounded.clamp(1, 99)
    } else {
        100
    }
}

/// Distinct service ids linked to the release.
pub fn linked_services(release: &Release) -> HashSet<Uuid> {
    release
        .service_links
        .iter()
        .map(|link| link.service_id)
        .collect()
}

/// Progress of `release` in `environment_id`.
pub fn progress(release: &Release, environment_id: Uuid) -> Progress {
    let linked = linked_services(release);
    let total = linked.len();
    if total == 0 {
        return Progress::EMPTY;
    }

    // Records for services no longer linked stay in the log but do not count.
    let deployed = release
        .deployments
        .iter()
        .filter(|d| d.environment_id == environment_id && d.is_success())
        .filter_map(|d| d.service_id)
        .filter(|service_id| linked.contains(service_id))
        .collect::<HashSet<_>>()
        .len();

    Progress {
        deployed,
        total,
        percent: percent_of(deployed, total),
    }
}

/// Latest successful deployment of `service_id` to `environment_id`, if any.
///
/// On equal `deployed_at` the record that comes first in the log wins.
pub fn service_status(
    release: &Release,
    environment_id: Uuid,
    service_id: Uuid,
) -> Option<&Deployment> {
    release
        .deployments
        .iter()
        .filter(|d| {
            d.environment_id == environment_id
                && d.service_id == Some(service_id)
                && d.is_success()
        })
        .fold(None, |latest: Option<&Deployment>, d| match latest {
            Some(current) if d.deployed_at <= current.deployed_at => Some(current),
            _ => Some(d),
        })
}

/// Progress card for one environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentProgress<'a> {
    pub environment: &'a Environment,
    pub progress: Progress,
}

/// One service row of the deployment matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow<'a> {
    pub link: &'a ReleaseServiceLink,
    /// Current deployment per environment, in environment order
    pub cells: Vec<Option<&'a Deployment>>,
}

/// Release detail overview: per-environment progress and the service ×
/// environment deployment matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseMatrix<'a> {
    pub environments: Vec<EnvironmentProgress<'a>>,
    pub rows: Vec<MatrixRow<'a>>,
}

/// Build the overview of `release` over `environments`, keeping their order.
pub fn release_matrix<'a>(
    release: &'a Release,
    environments: &'a [Environment],
) -> ReleaseMatrix<'a> {
    let progress_cards = environments
        .iter()
        .map(|environment| EnvironmentProgress {
            environment,
            progress: progress(release, environment.id),
        })
        .collect();

    let rows = release
        .service_links
        .iter()
        .map(|link| MatrixRow {
            link,
            cells: environments
                .iter()
                .map(|env| service_status(release, env.id, link.service_id))
                .collect(),
        })
        .collect();

    ReleaseMatrix {
        environments: progress_cards,
        rows,
    }
}

/// Compact per-environment badge shown in release listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge<'a> {
    pub environment: &'a str,
    pub percent: u32,
    pub tier: ProgressTier,
}

/// Badges for the release list. Empty for a release without services.
pub fn tracker_badges<'a>(release: &Release, environments: &'a [Environment]) -> Vec<Badge<'a>> {
    if release.service_links.is_empty() {
        return Vec::new();
    }
    environments
        .iter()
        .map(|env| {
            let progress = progress(release, env.id);
            Badge {
                environment: &env.name,
                percent: progress.percent,
                tier: progress.tier(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Service, DEPLOYMENT_SUCCESS};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn service(id: Uuid, name: &str) -> Service {
        Service {
            id,
            name: name.to_string(),
            description: None,
            owner: None,
            environment_id: None,
            status: Some("active".to_string()),
            repo_link: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn environment(name: &str) -> Environment {
        Environment {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn release_with(services: &[Uuid]) -> Release {
        Release {
            id: Uuid::new_v4(),
            name: "Release-2024.01".to_string(),
            version: "v1.0.0".to_string(),
            created_at: base_time(),
            planned_release_date: None,
            owner_id: None,
            owner: None,
            product_owner: None,
            qa: None,
            security_analyst: None,
            service_links: services
                .iter()
                .enumerate()
                .map(|(i, id)| ReleaseServiceLink {
                    service_id: *id,
                    pipeline_link: None,
                    version: None,
                    service: service(*id, &format!("service-{i}")),
                })
                .collect(),
            deployments: Vec::new(),
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
    }

    fn record(
        release: &mut Release,
        env: Uuid,
        service: Option<Uuid>,
        status: &str,
        minutes: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        release.deployments.push(Deployment {
            id,
            release_id: release.id,
            environment_id: env,
            service_id: service,
            status: status.to_string(),
            deployed_at: base_time() + Duration::minutes(minutes),
        });
        id
    }

    #[test]
    fn test_no_services_is_zero() {
        let mut release = release_with(&[]);
        let env = Uuid::new_v4();
        record(&mut release, env, Some(Uuid::new_v4()), DEPLOYMENT_SUCCESS, 0);

        assert_eq!(progress(&release, env), Progress::EMPTY);
        assert_eq!(progress(&release, Uuid::new_v4()).percent, 0);
    }

    #[test]
    fn test_half_then_full() {
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1, s2]);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 0);

        let p = progress(&release, env);
        assert_eq!(
            p,
            Progress {
                deployed: 1,
                total: 2,
                percent: 50
            }
        );
        assert_eq!(p.tier(), ProgressTier::Partial);

        record(&mut release, env, Some(s2), DEPLOYMENT_SUCCESS, 5);
        let p = progress(&release, env);
        assert_eq!(p.percent, 100);
        assert_eq!(p.tier(), ProgressTier::Full);
    }

    #[test]
    fn test_repeated_successes_count_once() {
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1, s2]);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 0);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 10);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 20);

        assert_eq!(progress(&release, env).deployed, 1);
    }

    #[test]
    fn test_only_matching_successful_records_count() {
        let (s1, s2, s3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (env, other_env) = (Uuid::new_v4(), Uuid::new_v4());
        let mut release = release_with(&[s1, s2, s3]);
        record(&mut release, env, Some(s1), "pending", 0);
        record(&mut release, env, Some(s2), "failed", 0);
        record(&mut release, env, None, DEPLOYMENT_SUCCESS, 0);
        record(&mut release, other_env, Some(s3), DEPLOYMENT_SUCCESS, 0);

        assert_eq!(progress(&release, env).deployed, 0);
        assert_eq!(progress(&release, env).tier(), ProgressTier::None);
        assert_eq!(
            progress(&release, other_env),
            Progress {
                deployed: 1,
                total: 3,
                percent: 33
            }
        );
    }

    #[test]
    fn test_unlinked_services_do_not_exceed_total() {
        let s1 = Uuid::new_v4();
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1]);
        record(&mut release, env, Some(Uuid::new_v4()), DEPLOYMENT_SUCCESS, 0);

        let p = progress(&release, env);
        assert_eq!(p.deployed, 0);
        assert!(p.deployed <= p.total);
    }

    #[test]
    fn test_duplicate_links_count_once() {
        let s1 = Uuid::new_v4();
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1, s1]);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 0);

        assert_eq!(
            progress(&release, env),
            Progress {
                deployed: 1,
                total: 1,
                percent: 100
            }
        );
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent_of(0, 0), 0);
        assert_eq!(percent_of(0, 5), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(1, 8), 13); // 12.5 rounds up
        assert_eq!(percent_of(1, 200), 1); // 0.5 rounds up
        assert_eq!(percent_of(7, 7), 100);
        assert_eq!(percent_of(9, 7), 100);
    }

    #[test]
    fn test_percent_never_rounds_into_wrong_tier() {
        assert_eq!(percent_of(1, 201), 1);
        assert_eq!(percent_of(199, 200), 99);
        assert_eq!(percent_of(999, 1000), 99);
    }

    #[test]
    fn test_full_only_when_everything_deployed() {
        for total in 1..=250usize {
            for deployed in 0..=total {
                let percent = percent_of(deployed, total);
                assert!(percent <= 100);
                assert_eq!(
                    percent == 100,
                    deployed == total,
                    "deployed={deployed} total={total}"
                );
                assert_eq!(percent == 0, deployed == 0, "deployed={deployed} total={total}");
            }
        }
    }

    #[test]
    fn test_tiers() {
        assert_eq!(ProgressTier::from_percent(0), ProgressTier::None);
        assert_eq!(ProgressTier::from_percent(1), ProgressTier::Partial);
        assert_eq!(ProgressTier::from_percent(99), ProgressTier::Partial);
        assert_eq!(ProgressTier::from_percent(100), ProgressTier::Full);
        assert_eq!(ProgressTier::Full.as_str(), "full");
    }

    #[test]
    fn test_service_status_picks_latest() {
        let s1 = Uuid::new_v4();
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1]);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 0);
        let newer = record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 30);
        record(&mut release, env, Some(s1), "failed", 60);

        assert_eq!(service_status(&release, env, s1).map(|d| d.id), Some(newer));

        // log order does not matter
        release.deployments.reverse();
        assert_eq!(service_status(&release, env, s1).map(|d| d.id), Some(newer));
    }

    #[test]
    fn test_service_status_tie_keeps_first() {
        let s1 = Uuid::new_v4();
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1]);
        let first = record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 10);
        record(&mut release, env, Some(s1), DEPLOYMENT_SUCCESS, 10);

        assert_eq!(service_status(&release, env, s1).map(|d| d.id), Some(first));
    }

    #[test]
    fn test_service_status_none() {
        let s1 = Uuid::new_v4();
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1]);
        assert!(service_status(&release, env, s1).is_none());

        record(&mut release, env, Some(s1), "failed", 0);
        record(&mut release, Uuid::new_v4(), Some(s1), DEPLOYMENT_SUCCESS, 0);
        assert!(service_status(&release, env, s1).is_none());
    }

    #[test]
    fn test_progress_is_pure() {
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let env = Uuid::new_v4();
        let mut release = release_with(&[s1, s2]);
        record(&mut release, env, Some(s2), DEPLOYMENT_SUCCESS, 0);
        let snapshot = release.clone();

        assert_eq!(progress(&release, env), progress(&release, env));
        assert_eq!(release, snapshot);
    }

    #[test]
    fn test_release_matrix() {
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let envs = vec![environment("staging"), environment("prod")];
        let mut release = release_with(&[s1, s2]);
        let d = record(&mut release, envs[0].id, Some(s1), DEPLOYMENT_SUCCESS, 0);
        record(&mut release, envs[0].id, Some(s2), DEPLOYMENT_SUCCESS, 0);

        let matrix = release_matrix(&release, &envs);
        assert_eq!(matrix.environments.len(), 2);
        assert_eq!(matrix.environments[0].environment.name, "staging");
        assert_eq!(matrix.environments[0].progress.tier(), ProgressTier::Full);
        assert_eq!(matrix.environments[1].progress.tier(), ProgressTier::None);

        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].link.service_id, s1);
        assert_eq!(matrix.rows[0].cells[0].map(|d| d.id), Some(d));
        assert!(matrix.rows[0].cells[1].is_none());
    }

    #[test]
    fn test_tracker_badges() {
        let envs = vec![environment("dev"), environment("prod")];
        assert!(tracker_badges(&release_with(&[]), &envs).is_empty());

        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut release = release_with(&[s1, s2]);
        record(&mut release, envs[0].id, Some(s1), DEPLOYMENT_SUCCESS, 0);

        let badges = tracker_badges(&release, &envs);
        assert_eq!(
            badges,
            vec![
                Badge {
                    environment: "dev",
                    percent: 50,
                    tier: ProgressTier::Partial
                },
                Badge {
                    environment: "prod",
                    percent: 0,
                    tier: ProgressTier::None
                },
            ]
        );
    }
}
