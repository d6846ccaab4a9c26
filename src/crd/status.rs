//! # Wavefront Status
//!
//! Aggregate and per-object health written to the status subresource.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate and per-object health values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    #[default]
    Installing,
    #[serde(rename = "Not Enabled")]
    NotEnabled,
    #[serde(rename = "Not Running")]
    NotRunning,
}

impl HealthStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Installing => "Installing",
            HealthStatus::NotEnabled => "Not Enabled",
            HealthStatus::NotRunning => "Not Running",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of one monitored workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub name: String,
    /// "Running (ready/desired)" or "Not Running"
    pub status: String,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default)]
    pub installing: bool,
}

/// Status of the Wavefront resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WavefrontStatus {
    pub status: HealthStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub resource_statuses: Vec<ResourceStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_display_names() {
        let status = WavefrontStatus {
            status: HealthStatus::NotEnabled,
            message: String::new(),
            resource_statuses: vec![ResourceStatus {
                name: "wavefront-proxy".to_string(),
                status: HealthStatus::NotRunning.to_string(),
                healthy: false,
                message: String::new(),
                installing: false,
            }],
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "Not Enabled");
        assert_eq!(json["resourceStatuses"][0]["status"], "Not Running");
        assert!(json["resourceStatuses"][0].get("message").is_none());
    }
}
