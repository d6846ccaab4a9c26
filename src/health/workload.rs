use crate::cluster::{parse, ClusterClient, ClusterError, ResourceKey};
use crate::components::{Workload, WorkloadKind};
use crate::crd::{HealthStatus, ResourceStatus};
use crate::health::oom::oom_killed_recently;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::DynamicObject;
use tracing::warn;

/// Ready and desired instance counts plus the pod selector of a live workload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replicas {
    pub ready: i32,
    pub desired: i32,
    pub selector: Option<String>,
}

/// Read counts the way each kind reports them
pub fn replicas(kind: WorkloadKind, obj: DynamicObject) -> Result<Replicas, ClusterError> {
    let (ready, desired, selector) = match kind {
        WorkloadKind::Deployment => {
            let deployment: Deployment = parse(obj)?;
            let spec = deployment.spec.unwrap_or_default();
            let status = deployment.status.unwrap_or_default();
            (
                status.available_replicas.unwrap_or(0),
                spec.replicas.unwrap_or(1),
                Some(spec.selector),
            )
        }
        WorkloadKind::DaemonSet => {
            let daemon_set: DaemonSet = parse(obj)?;
            let status = daemon_set.status.unwrap_or_default();
            (
                status.number_ready,
                status.desired_number_scheduled,
                daemon_set.spec.map(|spec| spec.selector),
            )
        }
        WorkloadKind::StatefulSet => {
            let stateful_set: StatefulSet = parse(obj)?;
            let spec = stateful_set.spec.unwrap_or_default();
            let status = stateful_set.status.unwrap_or_default();
            (
                status.ready_replicas.unwrap_or(0),
                spec.replicas.unwrap_or(1),
                Some(spec.selector),
            )
        }
    };
    Ok(Replicas {
        ready,
        desired,
        selector: selector.as_ref().and_then(label_selector),
    })
}

/// `k=v,k2=v2` from `matchLabels`; `None` when there are none
fn label_selector(selector: &LabelSelector) -> Option<String> {
    let labels = selector.match_labels.as_ref()?;
    if labels.is_empty() {
        return None;
    }
    Some(
        labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn not_running(workload: &Workload) -> ResourceStatus {
    ResourceStatus {
        name: workload.name.to_string(),
        status: HealthStatus::NotRunning.to_string(),
        healthy: false,
        message: format!("{} is not running", workload.name),
        installing: false,
    }
}

/// Health of one workload; lookup failures report as not running
pub async fn workload_status(
    client: &dyn ClusterClient,
    namespace: &str,
    workload: &Workload,
    now: DateTime<Utc>,
) -> ResourceStatus {
    let key = ResourceKey::namespaced(
        workload.kind.api_version(),
        workload.kind.kind(),
        namespace,
        workload.name,
    );
    let obj = match client.get(&key).await {
        Ok(Some(obj)) => obj,
        Ok(None) => return not_running(workload),
        Err(e) => {
            warn!(resource = %key, error = %e, "failed to look up workload for health check");
            return not_running(workload);
        }
    };
    let counts = match replicas(workload.kind, obj) {
        Ok(counts) => counts,
        Err(e) => {
            warn!(resource = %key, error = %e, "failed to read workload status");
            return not_running(workload);
        }
    };

    let mut status = ResourceStatus {
        name: workload.name.to_string(),
        status: format!("Running ({}/{})", counts.ready, counts.desired),
        healthy: counts.ready >= counts.desired,
        message: String::new(),
        installing: false,
    };
    if !status.healthy {
        status.message = format!(
            "not enough instances of {} are running ({}/{})",
            workload.name, counts.ready, counts.desired
        );
    }

    if let Some(selector) = counts.selector.as_deref() {
        match client.list("v1", "Pod", namespace, Some(selector)).await {
            Ok(pods) if pods.iter().any(|pod| oom_killed_recently(pod, now)) => {
                status.healthy = false;
                status.message = format!("{} containers were OOMKilled in the last 5m", workload.name);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(resource = %key, error = %e, "failed to list pods for OOM check");
            }
        }
    }
    status
}
