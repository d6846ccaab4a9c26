//! # Custom Resource Definitions
//!
//! CRD types for the operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - The `Wavefront` desired-state resource and its defaults
//! - `derived.rs` - Values the preprocessor derives each pass (never persisted)
//! - `resources.rs` - Container resource requests/limits and tolerations
//! - `overrides.rs` - The `ResourceOverrideSet` resource
//! - `status.rs` - Status types written back to both resources

mod derived;
mod overrides;
mod resources;
mod spec;
mod status;

pub use derived::{AuthMode, Derived, DerivedProxy, HttpProxySettings};
pub use overrides::{
    AllWorkloadsOverride, ResourceOverrideSet, ResourceOverrideSetSpec,
    ResourceOverrideSetStatus, TolerationOverride, WorkloadOverride,
};
pub use resources::{ResourceQuantities, Resources, Toleration};
pub use spec::{
    Autotracing, DataCollection, DataExport, Experimental, ExternalWavefrontProxy, Histogram,
    HttpProxy, Hub, Jaeger, LogFilters, Logging, Metrics, MetricsFilters, Otlp, Pixie,
    PixieTableStoreLimits, Tracing, Wavefront, WavefrontProxy, WavefrontSpec,
    WavefrontTracing, WorkloadSettings, Zipkin,
};
pub use status::{HealthStatus, ResourceStatus, WavefrontStatus};
