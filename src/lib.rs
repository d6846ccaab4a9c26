//! Wavefront Operator Library
//!
//! Reconciliation core of the Kubernetes operator that installs, configures
//! and self-heals the Wavefront observability stack.
//!
//! ## Quick Start
//!
//! ```rust
//! use wavefront_operator::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod cluster;
pub mod components;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod health;
pub mod observability;
pub mod patch;
pub mod prelude;
pub mod preprocess;
pub mod runtime;
pub mod server;
pub mod synthesis;
pub mod telemetry;
pub mod validation;
