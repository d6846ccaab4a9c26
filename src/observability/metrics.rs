//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `wavefront_operator_reconciliations_total` - Total number of reconciliations
//! - `wavefront_operator_reconciliation_errors_total` - Total number of failed reconciliations
//! - `wavefront_operator_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `wavefront_operator_resources_applied_total` - Resources created or patched
//! - `wavefront_operator_resources_deleted_total` - Resources deleted
//! - `wavefront_operator_validation_failures_total` - Passes that failed validation
//! - `wavefront_operator_requeues_total` - Requeues by reason
//! - `wavefront_operator_component_healthy` - 1 when a monitored workload is healthy, 0 otherwise

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGaugeVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wavefront_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wavefront_operator_reconciliation_errors_total",
        "Total number of failed reconciliations",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "wavefront_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static RESOURCES_APPLIED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wavefront_operator_resources_applied_total",
        "Total number of resources created or patched",
    )
    .expect("Failed to create RESOURCES_APPLIED_TOTAL metric - this should never happen")
});

static RESOURCES_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wavefront_operator_resources_deleted_total",
        "Total number of resources deleted",
    )
    .expect("Failed to create RESOURCES_DELETED_TOTAL metric - this should never happen")
});

static VALIDATION_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wavefront_operator_validation_failures_total",
        "Total number of reconciliations that failed validation",
    )
    .expect("Failed to create VALIDATION_FAILURES_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "wavefront_operator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static COMPONENT_HEALTHY: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "wavefront_operator_component_healthy",
            "Whether a monitored workload is healthy (1) or not (0)",
        ),
        &["name"],
    )
    .expect("Failed to create COMPONENT_HEALTHY metric - this should never happen")
});

/// Register all metrics with the registry
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(RESOURCES_APPLIED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESOURCES_DELETED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VALIDATION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMPONENT_HEALTHY.clone()))?;

    Ok(())
}

pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_resources_applied(count: u64) {
    RESOURCES_APPLIED_TOTAL.inc_by(count);
}

pub fn increment_resources_deleted(count: u64) {
    RESOURCES_DELETED_TOTAL.inc_by(count);
}

pub fn increment_validation_failures() {
    VALIDATION_FAILURES_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn set_component_healthy(name: &str, healthy: bool) {
    COMPONENT_HEALTHY
        .with_label_values(&[name])
        .set(i64::from(healthy));
}

/// Drop every per-workload gauge, used when everything is torn down
pub fn reset_component_health() {
    COMPONENT_HEALTHY.reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = RESOURCES_APPLIED_TOTAL.get();
        increment_resources_applied(3);
        assert_eq!(RESOURCES_APPLIED_TOTAL.get(), before + 3);
    }

    #[test]
    fn test_component_gauge() {
        set_component_healthy("wavefront-proxy-test", true);
        assert_eq!(COMPONENT_HEALTHY.with_label_values(&["wavefront-proxy-test"]).get(), 1);
        set_component_healthy("wavefront-proxy-test", false);
        assert_eq!(COMPONENT_HEALTHY.with_label_values(&["wavefront-proxy-test"]).get(), 0);
    }
}
