//! # Configuration
//!
//! Operator-level settings. The desired state of the observability stack lives
//! in the `Wavefront` custom resource; this module only covers how the operator
//! itself runs.

mod operator;

pub use operator::OperatorConfig;
