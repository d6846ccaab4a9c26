//! # Wavefront Spec
//!
//! The desired-state resource: one per cluster, in the operator namespace.

use crate::constants::DEFAULT_TOKEN_SECRET;
use crate::crd::{Derived, ResourceQuantities, Resources};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wavefront Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: wavefront.com/v1alpha1
/// kind: Wavefront
/// metadata:
///   name: wavefront
///   namespace: observability-system
/// spec:
///   clusterName: prod-us-east
///   wavefrontUrl: https://example.wavefront.com
///   dataCollection:
///     metrics:
///       enable: true
///     logging:
///       enable: true
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "Wavefront",
    group = "wavefront.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::WavefrontStatus",
    shortname = "wf",
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.status"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct WavefrontSpec {
    /// Name identifying this cluster in Wavefront
    #[serde(default)]
    pub cluster_name: String,
    /// Wavefront instance URL, e.g. https://example.wavefront.com
    #[serde(default)]
    pub wavefront_url: String,
    /// Secret holding the proxy's credentials
    #[serde(default = "default_token_secret")]
    pub wavefront_token_secret: String,
    /// Allow installing next to a legacy (manually deployed) collector or proxy
    #[serde(default)]
    pub allow_legacy_install: bool,
    /// Image pull secret added to every workload
    #[serde(default)]
    pub image_pull_secret: Option<String>,
    #[serde(default)]
    pub data_export: DataExport,
    #[serde(default)]
    pub data_collection: DataCollection,
    #[serde(default)]
    pub experimental: Experimental,
    /// Per-workload container resource overrides keyed by workload name
    #[serde(default)]
    pub workload_resources: BTreeMap<String, Resources>,
    /// Filled in by the preprocessor each pass
    #[serde(skip)]
    #[schemars(skip)]
    pub derived: Derived,
}

impl WavefrontSpec {
    /// The in-cluster proxy is deployed only when no external proxy is configured
    #[must_use]
    pub fn proxy_enabled(&self) -> bool {
        self.data_export.wavefront_proxy.enable
            && self.data_export.external_wavefront_proxy.url.is_empty()
    }

    /// Autotracing runs on Pixie, so enabling it force-enables Pixie
    #[must_use]
    pub fn pixie_enabled(&self) -> bool {
        self.experimental.hub.pixie.enable || self.experimental.autotracing.enable
    }
}

fn default_token_secret() -> String {
    DEFAULT_TOKEN_SECRET.to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    #[serde(default)]
    pub wavefront_proxy: WavefrontProxy,
    #[serde(default)]
    pub external_wavefront_proxy: ExternalWavefrontProxy,
}

/// An already-running proxy to send data to instead of deploying one
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalWavefrontProxy {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WavefrontProxy {
    pub enable: bool,
    pub metric_port: u16,
    pub delta_counter_port: u16,
    /// Extra command line arguments passed to the proxy
    pub args: String,
    pub replicas: i32,
    pub tracing: Tracing,
    pub histogram: Histogram,
    pub otlp: Otlp,
    pub http_proxy: HttpProxy,
    /// Name of a ConfigMap holding user preprocessor rules under `rules.yaml`
    pub preprocessor: String,
    pub resources: Resources,
}

impl Default for WavefrontProxy {
    fn default() -> Self {
        Self {
            enable: true,
            metric_port: 2878,
            delta_counter_port: 0,
            args: String::new(),
            replicas: 1,
            tracing: Tracing::default(),
            histogram: Histogram::default(),
            otlp: Otlp::default(),
            http_proxy: HttpProxy::default(),
            preprocessor: String::new(),
            resources: Resources::new(
                ResourceQuantities::new("100m", "1Gi"),
                ResourceQuantities::new("1000m", "4Gi"),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Tracing {
    pub wavefront: WavefrontTracing,
    pub jaeger: Jaeger,
    pub zipkin: Zipkin,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WavefrontTracing {
    pub port: u16,
    pub sampling_rate: String,
    pub sampling_duration: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Jaeger {
    pub port: u16,
    pub grpc_port: u16,
    pub http_port: u16,
    pub application_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Zipkin {
    pub port: u16,
    pub application_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Histogram {
    pub port: u16,
    pub minute_port: u16,
    pub hour_port: u16,
    pub day_port: u16,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Otlp {
    pub grpc_port: u16,
    pub http_port: u16,
    pub resource_attrs_on_metrics_included: bool,
}

/// Outbound HTTP proxy the Wavefront proxy should tunnel through
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpProxy {
    /// Secret with `http-url`, optional `basic-auth-username`, `basic-auth-password`
    /// and `tls-root-ca-bundle`
    pub secret: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DataCollection {
    pub metrics: Metrics,
    pub logging: Logging,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    pub enable: bool,
    /// Name of a ConfigMap replacing the generated collector configuration
    pub custom_config: String,
    pub default_collection_interval: String,
    pub enable_discovery: bool,
    pub filters: MetricsFilters,
    pub cluster_collector: WorkloadSettings,
    pub node_collector: WorkloadSettings,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            enable: true,
            custom_config: String::new(),
            default_collection_interval: "60s".to_string(),
            enable_discovery: true,
            filters: MetricsFilters::default(),
            cluster_collector: WorkloadSettings {
                resources: Resources::new(
                    ResourceQuantities::new("200m", "10Mi"),
                    ResourceQuantities::new("2000m", "512Mi"),
                ),
            },
            node_collector: WorkloadSettings {
                resources: Resources::new(
                    ResourceQuantities::new("200m", "10Mi"),
                    ResourceQuantities::new("200m", "256Mi"),
                ),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsFilters {
    pub allow_list: Vec<String>,
    pub deny_list: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadSettings {
    pub resources: Resources,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Logging {
    pub enable: bool,
    pub filters: LogFilters,
    /// Extra tags added to every log line
    pub tags: BTreeMap<String, String>,
    pub resources: Resources,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: false,
            filters: LogFilters::default(),
            tags: BTreeMap::new(),
            resources: Resources::new(
                ResourceQuantities::new("100m", "200Mi"),
                ResourceQuantities::new("", "500Mi"),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LogFilters {
    pub tag_allow_list: BTreeMap<String, Vec<String>>,
    pub tag_deny_list: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Experimental {
    pub autotracing: Autotracing,
    pub hub: Hub,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Autotracing {
    pub enable: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Hub {
    pub pixie: Pixie,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Pixie {
    pub enable: bool,
    pub table_store_limits: PixieTableStoreLimits,
    pub pem: WorkloadSettings,
}

impl Default for Pixie {
    fn default() -> Self {
        Self {
            enable: false,
            table_store_limits: PixieTableStoreLimits::default(),
            pem: WorkloadSettings {
                resources: Resources::new(
                    ResourceQuantities::new("100m", "600Mi"),
                    ResourceQuantities::new("1000m", "600Mi"),
                ),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PixieTableStoreLimits {
    pub total_mib: u32,
    pub http_events_percent: u32,
}

impl Default for PixieTableStoreLimits {
    fn default() -> Self {
        Self {
            total_mib: 150,
            http_events_percent: 20,
        }
    }
}
