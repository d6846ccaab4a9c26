//! # Components
//!
//! One factory per sub-system. Each turns the preprocessed desired state into
//! a flat, fully-resolved config that its templates render against, validates
//! it, and names the workloads it owns.
//!
//! ## Module Structure
//!
//! - `proxy.rs` - Wavefront proxy Deployment
//! - `metrics.rs` - Cluster collector Deployment and node collector DaemonSet
//! - `logging.rs` - Log shipper DaemonSet
//! - `pixie.rs` - Pixie agents (PEM, metadata, kelvin, query broker)
//! - `autotracing.rs` - Autotracing scripts (ConfigMaps only)
//! - `overrides.rs` - Per-workload patch assembly
//!
//! The component set is rebuilt from scratch every pass by [`build_components`].

mod autotracing;
mod logging;
mod metrics;
mod overrides;
mod pixie;
mod proxy;

pub use autotracing::AutotracingComponent;
pub use logging::LoggingComponent;
pub use metrics::MetricsComponent;
pub use overrides::workload_patch;
pub use pixie::PixieComponent;
pub use proxy::ProxyComponent;

use crate::crd::{ResourceOverrideSet, Wavefront};
use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
use crate::validation::ValidationResult;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Kinds of workloads the health check knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkloadKind {
    Deployment,
    DaemonSet,
    StatefulSet,
}

impl WorkloadKind {
    pub fn api_version(&self) -> &'static str {
        "apps/v1"
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::StatefulSet => "StatefulSet",
        }
    }
}

/// A workload owned by a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub kind: WorkloadKind,
    pub name: &'static str,
    /// False when the component is enabled but this workload is conditionally not provisioned
    pub provisioned: bool,
}

impl Workload {
    pub const fn new(kind: WorkloadKind, name: &'static str) -> Self {
        Self {
            kind,
            name,
            provisioned: true,
        }
    }

    #[must_use]
    pub fn provisioned_if(mut self, provisioned: bool) -> Self {
        self.provisioned = provisioned;
        self
    }
}

/// One sub-system of the observability stack
pub trait Component: Send + Sync + fmt::Debug {
    /// Template directory name
    fn name(&self) -> &'static str;

    fn enabled(&self) -> bool;

    /// Always empty when disabled
    fn validate(&self) -> ValidationResult;

    fn resources(&self, builder: &ResourceBuilder) -> Result<Synthesized, SynthesisError>;

    /// Every workload this component can own, enabled or not
    fn workloads(&self) -> Vec<Workload>;

    /// Workloads to health-check this pass
    fn monitored_workloads(&self) -> Vec<Workload> {
        if !self.enabled() {
            return Vec::new();
        }
        self.workloads()
            .into_iter()
            .filter(|workload| workload.provisioned)
            .collect()
    }
}

/// Values shared by every component config
#[derive(Debug, Clone, Serialize)]
pub struct ClusterContext {
    pub namespace: String,
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub operator_version: String,
    pub image_registry: String,
    pub image_pull_secret: Option<String>,
    pub openshift: bool,
    pub proxy_address: String,
}

impl ClusterContext {
    pub fn from_desired(wavefront: &Wavefront) -> Self {
        let spec = &wavefront.spec;
        Self {
            namespace: spec.derived.namespace.clone(),
            cluster_name: spec.cluster_name.clone(),
            cluster_uuid: spec.derived.cluster_uuid.clone(),
            operator_version: spec.derived.operator_version.clone(),
            image_registry: spec.derived.image_registry.clone(),
            image_pull_secret: spec.image_pull_secret.clone(),
            openshift: spec.derived.openshift,
            proxy_address: spec.derived.proxy_address.clone(),
        }
    }
}

/// The current component set for a preprocessed desired state
pub fn build_components(
    wavefront: &Wavefront,
    overrides: Option<&ResourceOverrideSet>,
) -> Vec<Box<dyn Component>> {
    assemble(wavefront, overrides, false)
}

/// The same set with every component disabled, so synthesis yields delete-only lists
pub fn disabled_components(wavefront: &Wavefront) -> Vec<Box<dyn Component>> {
    assemble(wavefront, None, true)
}

fn assemble(
    wavefront: &Wavefront,
    overrides: Option<&ResourceOverrideSet>,
    force_disabled: bool,
) -> Vec<Box<dyn Component>> {
    if force_disabled {
        return vec![
            Box::new(ProxyComponent::from_desired(wavefront, None).disabled()),
            Box::new(MetricsComponent::from_desired(wavefront, None).disabled()),
            Box::new(LoggingComponent::from_desired(wavefront, None).disabled()),
            Box::new(PixieComponent::from_desired(wavefront, None).disabled()),
            Box::new(AutotracingComponent::from_desired(wavefront, None).disabled()),
        ];
    }
    vec![
        Box::new(ProxyComponent::from_desired(wavefront, overrides)),
        Box::new(MetricsComponent::from_desired(wavefront, overrides)),
        Box::new(LoggingComponent::from_desired(wavefront, overrides)),
        Box::new(PixieComponent::from_desired(wavefront, overrides)),
        Box::new(AutotracingComponent::from_desired(wavefront, overrides)),
    ]
}

/// Names of every workload any component can own
pub fn known_workloads(components: &[Box<dyn Component>]) -> BTreeSet<String> {
    components
        .iter()
        .flat_map(|component| component.workloads())
        .map(|workload| workload.name.to_string())
        .collect()
}

/// Validation of every component, merged
pub fn validate_components(components: &[Box<dyn Component>]) -> ValidationResult {
    components.iter().map(|component| component.validate()).collect()
}
