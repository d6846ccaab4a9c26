use crate::components::{workload_patch, ClusterContext, Component, Workload, WorkloadKind};
use crate::constants::{LOGGING_VERSION, RESERVED_IDENTITY_TAGS};
use crate::crd::{LogFilters, ResourceOverrideSet, Resources, Wavefront};
use crate::patch::Composed;
use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
use crate::validation::{validate_resources, ValidationResult};
use serde::Serialize;
use std::collections::BTreeMap;

const DEFAULT_PROXY_PORT: u16 = 2878;

const WORKLOADS: [Workload; 1] = [Workload::new(WorkloadKind::DaemonSet, "wavefront-logging")];

#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    #[serde(flatten)]
    pub cluster: ClusterContext,
    pub enabled: bool,
    pub image_tag: &'static str,
    pub filters: LogFilters,
    pub tags: BTreeMap<String, String>,
    pub resources: Resources,
    /// Host and port the shipper sends to, split from the proxy address
    pub proxy_host: String,
    pub proxy_port: String,
}

#[derive(Debug)]
pub struct LoggingComponent {
    config: LoggingConfig,
    patch: Composed,
}

impl LoggingComponent {
    pub fn from_desired(wavefront: &Wavefront, overrides: Option<&ResourceOverrideSet>) -> Self {
        let spec = &wavefront.spec;
        let logging = &spec.data_collection.logging;
        let (proxy_host, proxy_port) = split_proxy_address(&spec.derived.proxy_address);
        Self {
            config: LoggingConfig {
                cluster: ClusterContext::from_desired(wavefront),
                enabled: logging.enable,
                image_tag: LOGGING_VERSION,
                filters: logging.filters.clone(),
                tags: logging.tags.clone(),
                resources: logging.resources.clone(),
                proxy_host,
                proxy_port,
            },
            patch: workload_patch(spec, overrides, &WORKLOADS),
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }
}

/// `wavefront-proxy:2878` or `http://proxy.example.com:2878/` into host and port
fn split_proxy_address(address: &str) -> (String, String) {
    let address = address
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');
    match address.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.to_string()),
        None => (address.to_string(), DEFAULT_PROXY_PORT.to_string()),
    }
}

impl Component for LoggingComponent {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !self.config.enabled {
            return result;
        }
        if self.config.cluster.proxy_address.is_empty() {
            result.add_error(
                "invalid dataCollection.logging: requires dataExport.wavefrontProxy or dataExport.externalWavefrontProxy",
            );
        }
        for reserved in RESERVED_IDENTITY_TAGS {
            if self.config.tags.contains_key(reserved) {
                result.add_error(format!(
                    "invalid dataCollection.logging.tags: '{reserved}' is set by the operator"
                ));
            }
        }
        result.merge(validate_resources(
            "dataCollection.logging",
            &self.config.resources,
        ));
        result
    }

    fn resources(&self, builder: &ResourceBuilder) -> Result<Synthesized, SynthesisError> {
        builder.build(self.name(), self.enabled(), &self.config, &self.patch)
    }

    fn workloads(&self) -> Vec<Workload> {
        WORKLOADS.to_vec()
    }
}
