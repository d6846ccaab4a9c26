use crate::components::{workload_patch, ClusterContext, Component, Workload, WorkloadKind};
use crate::constants::COLLECTOR_VERSION;
use crate::crd::{MetricsFilters, ResourceOverrideSet, Resources, Wavefront};
use crate::patch::Composed;
use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
use crate::validation::{validate_resources, ValidationResult};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

const WORKLOADS: [Workload; 2] = [
    Workload::new(WorkloadKind::Deployment, "wavefront-cluster-collector"),
    Workload::new(WorkloadKind::DaemonSet, "wavefront-node-collector"),
];

static COLLECTION_INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(s|m|h)$").expect("interval regex is valid"));

#[derive(Debug, Clone, Serialize)]
pub struct MetricsConfig {
    #[serde(flatten)]
    pub cluster: ClusterContext,
    pub enabled: bool,
    pub image_tag: &'static str,
    /// ConfigMap replacing the generated collector config, empty for the generated one
    pub custom_config: String,
    pub config_hash: String,
    pub default_collection_interval: String,
    pub enable_discovery: bool,
    pub filters: MetricsFilters,
    pub cluster_collector_resources: Resources,
    pub node_collector_resources: Resources,
}

#[derive(Debug)]
pub struct MetricsComponent {
    config: MetricsConfig,
    patch: Composed,
}

impl MetricsComponent {
    pub fn from_desired(wavefront: &Wavefront, overrides: Option<&ResourceOverrideSet>) -> Self {
        let spec = &wavefront.spec;
        let metrics = &spec.data_collection.metrics;
        let config = MetricsConfig {
            cluster: ClusterContext::from_desired(wavefront),
            enabled: metrics.enable,
            image_tag: COLLECTOR_VERSION,
            custom_config: metrics.custom_config.clone(),
            config_hash: spec.derived.collector_config_hash.clone(),
            default_collection_interval: metrics.default_collection_interval.clone(),
            enable_discovery: metrics.enable_discovery,
            filters: metrics.filters.clone(),
            cluster_collector_resources: metrics.cluster_collector.resources.clone(),
            node_collector_resources: metrics.node_collector.resources.clone(),
        };
        Self {
            config,
            patch: workload_patch(spec, overrides, &WORKLOADS),
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }
}

impl Component for MetricsComponent {
    fn name(&self) -> &'static str {
        "metrics"
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
                "invalid dataCollection.metrics: requires dataExport.wavefrontProxy or dataExport.externalWavefrontProxy",
            );
        }
        if self.config.cluster.cluster_name.is_empty() {
            result.add_error("missing field: clusterName");
        }
        if !COLLECTION_INTERVAL.is_match(&self.config.default_collection_interval) {
            result.add_error(format!(
                "invalid dataCollection.metrics.defaultCollectionInterval: '{}'",
                self.config.default_collection_interval
            ));
        }
        result.merge(validate_resources(
            "dataCollection.metrics.clusterCollector",
            &self.config.cluster_collector_resources,
        ));
        result.merge(validate_resources(
            "dataCollection.metrics.nodeCollector",
            &self.config.node_collector_resources,
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
