use crate::components::{workload_patch, ClusterContext, Component, Workload, WorkloadKind};
use crate::constants::PIXIE_VERSION;
use crate::crd::{PixieTableStoreLimits, ResourceOverrideSet, Resources, Wavefront};
use crate::patch::Composed;
use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
use crate::validation::{validate_resources, ValidationResult};
use serde::Serialize;

const PEM: Workload = Workload::new(WorkloadKind::DaemonSet, "vizier-pem");
const METADATA: Workload = Workload::new(WorkloadKind::StatefulSet, "vizier-metadata");
const KELVIN: Workload = Workload::new(WorkloadKind::Deployment, "kelvin");
const QUERY_BROKER: Workload = Workload::new(WorkloadKind::Deployment, "vizier-query-broker");

#[derive(Debug, Clone, Serialize)]
pub struct PixieConfig {
    #[serde(flatten)]
    pub cluster: ClusterContext,
    pub enabled: bool,
    pub image_tag: &'static str,
    /// Full hub install; autotracing alone only needs the PEM and metadata service
    pub hub_enabled: bool,
    pub in_cluster_proxy: bool,
    pub otlp_grpc_port: u16,
    pub table_store_limits: PixieTableStoreLimits,
    pub pem_resources: Resources,
}

#[derive(Debug)]
pub struct PixieComponent {
    config: PixieConfig,
    patch: Composed,
}

impl PixieComponent {
    pub fn from_desired(wavefront: &Wavefront, overrides: Option<&ResourceOverrideSet>) -> Self {
        let spec = &wavefront.spec;
        let pixie = &spec.experimental.hub.pixie;
        let workloads = [PEM, METADATA, KELVIN, QUERY_BROKER];
        Self {
            config: PixieConfig {
                cluster: ClusterContext::from_desired(wavefront),
                enabled: spec.pixie_enabled(),
                image_tag: PIXIE_VERSION,
                hub_enabled: pixie.enable,
                in_cluster_proxy: spec.proxy_enabled(),
                otlp_grpc_port: spec.data_export.wavefront_proxy.otlp.grpc_port,
                table_store_limits: pixie.table_store_limits.clone(),
                pem_resources: pixie.pem.resources.clone(),
            },
            patch: workload_patch(spec, overrides, &workloads),
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }
}

impl Component for PixieComponent {
    fn name(&self) -> &'static str {
        "pixie"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !self.config.enabled {
            return result;
        }
        if !self.config.in_cluster_proxy {
            result.add_error("invalid experimental.hub.pixie: requires dataExport.wavefrontProxy to be enabled");
        } else if self.config.otlp_grpc_port == 0 {
            result.add_error(
                "invalid experimental.hub.pixie: requires dataExport.wavefrontProxy.otlp.grpcPort",
            );
        }
        let limits = &self.config.table_store_limits;
        if limits.http_events_percent > 100 {
            result.add_error(format!(
                "invalid experimental.hub.pixie.tableStoreLimits.httpEventsPercent: {} is above 100",
                limits.http_events_percent
            ));
        }
        result.merge(validate_resources(
            "experimental.hub.pixie.pem",
            &self.config.pem_resources,
        ));
        result
    }

    fn resources(&self, builder: &ResourceBuilder) -> Result<Synthesized, SynthesisError> {
        builder.build(self.name(), self.enabled(), &self.config, &self.patch)
    }

    fn workloads(&self) -> Vec<Workload> {
        let hub = self.config.hub_enabled;
        vec![
            PEM,
            METADATA,
            KELVIN.provisioned_if(hub),
            QUERY_BROKER.provisioned_if(hub),
        ]
    }
}
