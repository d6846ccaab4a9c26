//! # Apply
//!
//! Pushes a synthesized bundle to the cluster: every apply-bound object is
//! created or merge-patched, then every delete-bound object is removed.

use crate::cluster::{ClusterClient, ClusterError, ResourceKey};
use crate::observability::metrics;
use kube::api::DynamicObject;
use tracing::debug;

/// Create the object when absent, merge-patch it otherwise
pub async fn apply_resource(
    client: &dyn ClusterClient,
    obj: &DynamicObject,
) -> Result<(), ClusterError> {
    let key = ResourceKey::of(obj)?;
    if client.get(&key).await?.is_some() {
        debug!(resource = %key, "patching");
        client.patch(obj).await
    } else {
        debug!(resource = %key, "creating");
        client.create(obj).await
    }
}

/// Apply every object in order; the first failure aborts
pub async fn apply_all(
    client: &dyn ClusterClient,
    objects: &[DynamicObject],
) -> Result<usize, ClusterError> {
    for obj in objects {
        apply_resource(client, obj).await?;
    }
    metrics::increment_resources_applied(objects.len() as u64);
    Ok(objects.len())
}

/// Delete every object in order; already-gone objects and unknown kinds are skipped
pub async fn delete_all(
    client: &dyn ClusterClient,
    objects: &[DynamicObject],
) -> Result<usize, ClusterError> {
    for obj in objects {
        let key = ResourceKey::of(obj)?;
        match client.delete(&key).await {
            Ok(()) => debug!(resource = %key, "deleted"),
            Err(e) if e.is_not_found() => debug!(resource = %key, "already absent"),
            Err(e) => return Err(e),
        }
    }
    metrics::increment_resources_deleted(objects.len() as u64);
    Ok(objects.len())
}
