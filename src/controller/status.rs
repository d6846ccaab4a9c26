//! # Status
//!
//! Status values derived from validation, and best-effort status writes.

use crate::cluster::{ClusterClient, ResourceKey};
use crate::crd::{HealthStatus, ResourceOverrideSetStatus, WavefrontStatus};
use crate::validation::ValidationResult;
use serde::Serialize;
use tracing::{debug, warn};

/// Status reported when validation failed and nothing was applied
pub fn validation_failed_status(validation: &ValidationResult) -> WavefrontStatus {
    WavefrontStatus {
        status: HealthStatus::Unhealthy,
        message: validation.message(),
        resource_statuses: Vec::new(),
    }
}

/// Append validation warnings to a computed status message
pub fn with_warnings(mut status: WavefrontStatus, validation: &ValidationResult) -> WavefrontStatus {
    if validation.is_warning() {
        status.message = format!("{}; {}", status.message, validation.message());
    }
    status
}

pub fn override_set_status(validation: &ValidationResult) -> ResourceOverrideSetStatus {
    let status = if validation.is_error() {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Healthy
    };
    ResourceOverrideSetStatus {
        status: status.to_string(),
        message: validation.message(),
    }
}

/// Write `desired` to the status subresource when it differs from `current`
///
/// Returns whether a write succeeded. Failures are logged, never propagated.
pub async fn write_status_if_changed<S>(
    client: &dyn ClusterClient,
    key: &ResourceKey,
    current: Option<&S>,
    desired: &S,
) -> bool
where
    S: Serialize + PartialEq,
{
    if current == Some(desired) {
        debug!(resource = %key, "status unchanged");
        return false;
    }
    let value = match serde_json::to_value(desired) {
        Ok(value) => value,
        Err(e) => {
            warn!(resource = %key, error = %e, "failed to serialize status");
            return false;
        }
    };
    match client.patch_status(key, value).await {
        Ok(()) => true,
        Err(e) => {
            warn!(resource = %key, error = %e, "failed to update status");
            false
        }
    }
}
