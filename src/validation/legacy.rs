use crate::cluster::{ClusterClient, ClusterError, ResourceKey};
use crate::validation::ValidationResult;

/// Workloads left behind by manual or Helm installs, as `(apiVersion, kind, namespace, name)`
pub const LEGACY_INSTALLS: [(&str, &str, &str, &str); 5] = [
    ("apps/v1", "DaemonSet", "wavefront-collector", "wavefront-collector"),
    ("apps/v1", "Deployment", "wavefront-collector", "wavefront-collector"),
    ("apps/v1", "Deployment", "default", "wavefront-proxy"),
    ("apps/v1", "DaemonSet", "wavefront", "wavefront-collector"),
    ("apps/v1", "Deployment", "wavefront", "wavefront-proxy"),
];

/// Legacy workloads present in the cluster, in detection order
pub async fn detect_legacy_installs(
    client: &dyn ClusterClient,
) -> Result<Vec<ResourceKey>, ClusterError> {
    let mut found = Vec::new();
    for (api_version, kind, namespace, name) in LEGACY_INSTALLS {
        let key = ResourceKey::namespaced(api_version, kind, namespace, name);
        if client.get(&key).await?.is_some() {
            found.push(key);
        }
    }
    Ok(found)
}

/// Legacy installs are errors unless explicitly allowed, then warnings
pub async fn validate_legacy_installs(
    client: &dyn ClusterClient,
    allow_legacy_install: bool,
) -> Result<ValidationResult, ClusterError> {
    let mut result = ValidationResult::new();
    let mut reported: Vec<String> = Vec::new();

    for key in detect_legacy_installs(client).await? {
        let namespace = key.namespace.unwrap_or_default();
        if reported.contains(&namespace) {
            continue;
        }
        let message = format!("Found legacy Wavefront installation in the '{namespace}' namespace");
        if allow_legacy_install {
            result.add_warning(message);
        } else {
            result.add_error(message);
        }
        reported.push(namespace);
    }
    Ok(result)
}
