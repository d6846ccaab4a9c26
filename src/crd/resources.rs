//! # Resource Types
//!
//! Container resource requests/limits and tolerations as they appear in both
//! custom resources.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CPU, memory and ephemeral storage quantities. An empty string means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuantities {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpu: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memory: String,
    #[serde(
        default,
        rename = "ephemeral-storage",
        skip_serializing_if = "String::is_empty"
    )]
    pub ephemeral_storage: String,
}

impl ResourceQuantities {
    pub fn new(cpu: &str, memory: &str) -> Self {
        Self {
            cpu: cpu.to_string(),
            memory: memory.to_string(),
            ephemeral_storage: String::new(),
        }
    }

    /// Field name and value pairs in a fixed order
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("cpu", self.cpu.as_str()),
            ("memory", self.memory.as_str()),
            ("ephemeral-storage", self.ephemeral_storage.as_str()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_empty())
    }
}

/// Container resource requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default)]
    pub requests: ResourceQuantities,
    #[serde(default)]
    pub limits: ResourceQuantities,
}

impl Resources {
    pub fn new(requests: ResourceQuantities, limits: ResourceQuantities) -> Self {
        Self { requests, limits }
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.limits.is_empty()
    }

    /// Default each unset request to its limit.
    ///
    /// A request never raises a limit; only the limit -> request direction is filled in.
    pub fn default_requests_to_limits(&mut self) {
        let limits = self.limits.clone();
        fill(&mut self.requests.cpu, &limits.cpu);
        fill(&mut self.requests.memory, &limits.memory);
        fill(&mut self.requests.ephemeral_storage, &limits.ephemeral_storage);
    }
}

fn fill(request: &mut String, limit: &str) {
    if request.is_empty() && !limit.is_empty() {
        *request = limit.to_string();
    }
}

/// Pod toleration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}
