//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use wavefront_operator::prelude::*;
//! ```
//!
//! This brings into scope:
//! - All CRD types (Wavefront, ResourceOverrideSet, statuses)
//! - The cluster client trait and its error type
//! - Reconciler types (Reconciler, ReconcilerError, etc.)
//! - The component and patch traits
//! - Operator configuration

pub use crate::crd::*;

pub use crate::cluster::{ClusterClient, ClusterError, KubeClusterClient, ResourceKey};

pub use crate::controller::{reconcile, BackoffState, PassOutcome, Reconciler, ReconcilerError};

pub use crate::components::{build_components, Component, Workload, WorkloadKind};
pub use crate::patch::Patch;
pub use crate::synthesis::{ResourceBuilder, Synthesized, SynthesisError};
pub use crate::validation::ValidationResult;

pub use crate::config::OperatorConfig;
