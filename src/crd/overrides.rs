//! # ResourceOverrideSet
//!
//! Optional singleton carrying toleration and container-resource overrides per
//! workload, plus tolerations applied to every workload.

use crate::crd::{Resources, Toleration};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ResourceOverrideSet Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: wavefront.com/v1alpha1
/// kind: ResourceOverrideSet
/// metadata:
///   name: resource-overrides
///   namespace: observability-system
/// spec:
///   allWorkloads:
///     tolerations:
///       add:
///         - key: dedicated
///           operator: Exists
///   workloads:
///     wavefront-proxy:
///       resources:
///         limits:
///           memory: 6Gi
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ResourceOverrideSet",
    group = "wavefront.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::ResourceOverrideSetStatus",
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOverrideSetSpec {
    /// Applied to every workload before any per-workload override
    #[serde(default)]
    pub all_workloads: AllWorkloadsOverride,
    /// Overrides keyed by workload name
    #[serde(default)]
    pub workloads: BTreeMap<String, WorkloadOverride>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AllWorkloadsOverride {
    pub tolerations: TolerationOverride,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadOverride {
    pub tolerations: TolerationOverride,
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TolerationOverride {
    pub add: Vec<Toleration>,
    pub remove: Vec<Toleration>,
}

impl TolerationOverride {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOverrideSetStatus {
    /// Healthy or Unhealthy
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}
