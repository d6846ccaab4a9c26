//! # Observability
//!
//! - `metrics.rs` - Prometheus metrics served on `/metrics`
//! - `logging.rs` - tracing subscriber setup

pub mod logging;
pub mod metrics;
