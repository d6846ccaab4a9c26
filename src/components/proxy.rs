use crate::components::{workload_patch, ClusterContext, Component, Workload, WorkloadKind};
use crate::constants::PROXY_VERSION;
use crate::crd::{
    Histogram, HttpProxySettings, Otlp, ResourceOverrideSet, Resources, Tracing, Wavefront,
};
use crate::patch::Composed;
use crate::preprocess::listener_ports;
use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
use crate::validation::{validate_resources, ValidationResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const WORKLOADS: [Workload; 1] = [Workload::new(WorkloadKind::Deployment, "wavefront-proxy")];

/// Everything the proxy templates reference
#[derive(Debug, Clone, Serialize)]
pub struct ProxyConfig {
    #[serde(flatten)]
    pub cluster: ClusterContext,
    pub enabled: bool,
    pub image_tag: &'static str,
    pub wavefront_url: String,
    pub token_secret: String,
    pub auth_mode: String,
    pub config_hash: String,
    pub metric_port: u16,
    pub delta_counter_port: u16,
    pub enabled_ports: String,
    /// Container ports to expose, same set as `enabled_ports`
    pub listener_ports: Vec<u16>,
    pub args: String,
    pub replicas: i32,
    pub tracing: Tracing,
    pub histogram: Histogram,
    pub otlp: Otlp,
    pub http_proxy: Option<HttpProxySettings>,
    pub http_proxy_secret: String,
    pub port_rules: BTreeMap<String, Vec<Value>>,
    pub global_rules: Vec<Value>,
    pub resources: Resources,
}

#[derive(Debug)]
pub struct ProxyComponent {
    config: ProxyConfig,
    patch: Composed,
}

impl ProxyComponent {
    pub fn from_desired(wavefront: &Wavefront, overrides: Option<&ResourceOverrideSet>) -> Self {
        let spec = &wavefront.spec;
        let proxy = &spec.data_export.wavefront_proxy;
        let derived = &spec.derived.proxy;
        let config = ProxyConfig {
            cluster: ClusterContext::from_desired(wavefront),
            enabled: spec.proxy_enabled(),
            image_tag: PROXY_VERSION,
            wavefront_url: spec.wavefront_url.clone(),
            token_secret: spec.wavefront_token_secret.clone(),
            auth_mode: derived
                .auth
                .map(|mode| mode.as_str().to_string())
                .unwrap_or_default(),
            config_hash: derived.config_hash.clone(),
            metric_port: proxy.metric_port,
            delta_counter_port: proxy.delta_counter_port,
            enabled_ports: derived.enabled_ports.clone(),
            listener_ports: listener_ports(proxy),
            args: proxy.args.clone(),
            replicas: proxy.replicas,
            tracing: proxy.tracing.clone(),
            histogram: proxy.histogram.clone(),
            otlp: proxy.otlp.clone(),
            http_proxy: derived.http_proxy.clone(),
            http_proxy_secret: proxy.http_proxy.secret.clone(),
            port_rules: derived.port_rules.clone(),
            global_rules: derived.global_rules.clone(),
            resources: proxy.resources.clone(),
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

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

impl Component for ProxyComponent {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !self.config.enabled {
            return result;
        }
        if self.config.wavefront_url.is_empty() {
            result.add_error("missing field: wavefrontUrl");
        }
        if self.config.cluster.cluster_name.is_empty() {
            result.add_error("missing field: clusterName");
        }
        if self.config.token_secret.is_empty() {
            result.add_error("missing field: wavefrontTokenSecret");
        }
        if self.config.metric_port == 0 {
            result.add_error("invalid dataExport.wavefrontProxy.metricPort: must be non-zero");
        }
        if self.config.replicas < 1 {
            result.add_error("invalid dataExport.wavefrontProxy.replicas: must be at least 1");
        }
        result.merge(validate_resources(
            "dataExport.wavefrontProxy",
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
