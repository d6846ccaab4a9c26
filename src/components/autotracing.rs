use crate::components::{workload_patch, ClusterContext, Component, Workload};
use crate::crd::{ResourceOverrideSet, Wavefront};
use crate::patch::Composed;
use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
use crate::validation::ValidationResult;
use serde::Serialize;

/// Autotracing ships PxL scripts as ConfigMaps; it runs no workloads of its own
#[derive(Debug, Clone, Serialize)]
pub struct AutotracingConfig {
    #[serde(flatten)]
    pub cluster: ClusterContext,
    pub enabled: bool,
}

#[derive(Debug)]
pub struct AutotracingComponent {
    config: AutotracingConfig,
    patch: Composed,
}

impl AutotracingComponent {
    pub fn from_desired(wavefront: &Wavefront, overrides: Option<&ResourceOverrideSet>) -> Self {
        Self {
            config: AutotracingConfig {
                cluster: ClusterContext::from_desired(wavefront),
                enabled: wavefront.spec.experimental.autotracing.enable,
            },
            patch: workload_patch(&wavefront.spec, overrides, &[]),
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }
}

impl Component for AutotracingComponent {
    fn name(&self) -> &'static str {
        "autotracing"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn validate(&self) -> ValidationResult {
        ValidationResult::new()
    }

    fn resources(&self, builder: &ResourceBuilder) -> Result<Synthesized, SynthesisError> {
        builder.build(self.name(), self.enabled(), &self.config, &self.patch)
    }

    fn workloads(&self) -> Vec<Workload> {
        Vec::new()
    }
}
