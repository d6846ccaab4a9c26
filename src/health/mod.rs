//! # Health
//!
//! Summarizes the live state of every monitored workload into one status.
//!
//! Aggregation, in order:
//! - nothing monitored: `Not Enabled`
//! - every workload healthy: `Healthy`
//! - the desired-state resource is younger than [`INSTALL_GRACE_PERIOD`]:
//!   `Installing`, with every workload marked installing
//! - otherwise `Unhealthy`, with the unhealthy workload messages joined by `; `
//!
//! A workload is unhealthy when fewer instances are ready than desired, or when
//! one of its pods was OOM killed within the last five minutes. Both time
//! windows are strict: something exactly five minutes old is outside them.

mod oom;
mod workload;

pub use oom::oom_killed_recently;
pub use workload::{replicas, workload_status, Replicas};

use crate::components::Component;
use crate::constants::INSTALL_GRACE_PERIOD;
use crate::crd::{HealthStatus, ResourceStatus, Wavefront, WavefrontStatus};
use chrono::{DateTime, Utc};
use kube::ResourceExt;

/// Query every monitored workload and aggregate
pub async fn generate_status(
    client: &dyn crate::cluster::ClusterClient,
    wavefront: &Wavefront,
    components: &[Box<dyn Component>],
    now: DateTime<Utc>,
) -> WavefrontStatus {
    let namespace = if wavefront.spec.derived.namespace.is_empty() {
        wavefront.namespace().unwrap_or_default()
    } else {
        wavefront.spec.derived.namespace.clone()
    };

    let mut statuses = Vec::new();
    for component in components {
        for workload in component.monitored_workloads() {
            statuses.push(workload_status(client, &namespace, &workload, now).await);
        }
    }
    aggregate(statuses, created_at(wavefront), now)
}

/// Creation time of the desired-state resource
pub fn created_at(wavefront: &Wavefront) -> Option<DateTime<Utc>> {
    let raw = serde_json::to_value(wavefront.metadata.creation_timestamp.as_ref()?).ok()?;
    DateTime::parse_from_rfc3339(raw.as_str()?)
        .ok()
        .map(|created| created.with_timezone(&Utc))
}

/// Combine per-workload statuses into the aggregate
pub fn aggregate(
    mut statuses: Vec<ResourceStatus>,
    created: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> WavefrontStatus {
    if statuses.is_empty() {
        return WavefrontStatus {
            status: HealthStatus::NotEnabled,
            message: "No components are enabled.".to_string(),
            resource_statuses: statuses,
        };
    }

    if statuses.iter().all(|status| status.healthy) {
        return WavefrontStatus {
            status: HealthStatus::Healthy,
            message: "All components are healthy.".to_string(),
            resource_statuses: statuses,
        };
    }

    if created.is_some_and(|created| within_grace_period(created, now)) {
        for status in &mut statuses {
            status.installing = true;
        }
        return WavefrontStatus {
            status: HealthStatus::Installing,
            message: "Installing components.".to_string(),
            resource_statuses: statuses,
        };
    }

    let message = statuses
        .iter()
        .filter(|status| !status.healthy)
        .map(|status| status.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    WavefrontStatus {
        status: HealthStatus::Unhealthy,
        message,
        resource_statuses: statuses,
    }
}

fn within_grace_period(created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match (now - created).to_std() {
        Ok(age) => age < INSTALL_GRACE_PERIOD,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn status(name: &str, healthy: bool) -> ResourceStatus {
        ResourceStatus {
            name: name.to_string(),
            status: if healthy { "Running (1/1)" } else { "Running (0/1)" }.to_string(),
            healthy,
            message: if healthy {
                String::new()
            } else {
                format!("not enough instances of {name} are running (0/1)")
            },
            installing: false,
        }
    }

    #[test]
    fn test_nothing_monitored_is_not_enabled() {
        let result = aggregate(vec![], None, now());
        assert_eq!(result.status, HealthStatus::NotEnabled);
    }

    #[test]
    fn test_all_healthy() {
        let result = aggregate(
            vec![status("wavefront-proxy", true), status("wavefront-node-collector", true)],
            Some(now()),
            now(),
        );
        assert_eq!(result.status, HealthStatus::Healthy);
        assert!(result.resource_statuses.iter().all(|s| !s.installing));
    }

    #[test]
    fn test_under_grace_is_installing() {
        let created = now() - Duration::minutes(5) + Duration::seconds(1);
        let result = aggregate(
            vec![status("wavefront-proxy", true), status("wavefront-node-collector", false)],
            Some(created),
            now(),
        );
        assert_eq!(result.status, HealthStatus::Installing);
        assert!(result.resource_statuses.iter().all(|s| s.installing));
    }

    #[test]
    fn test_exactly_at_grace_is_unhealthy() {
        let created = now() - Duration::minutes(5);
        let result = aggregate(
            vec![
                status("wavefront-proxy", false),
                status("wavefront-node-collector", true),
                status("wavefront-logging", false),
            ],
            Some(created),
            now(),
        );
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(
            result.message,
            "not enough instances of wavefront-proxy are running (0/1); not enough instances of wavefront-logging are running (0/1)"
        );
    }

    #[test]
    fn test_unknown_creation_time_is_not_installing() {
        let result = aggregate(vec![status("wavefront-proxy", false)], None, now());
        assert_eq!(result.status, HealthStatus::Unhealthy);
    }
}
