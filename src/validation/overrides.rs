use crate::crd::{ResourceOverrideSet, Resources};
use crate::validation::{validate_resources, ValidationResult};
use std::collections::{BTreeMap, BTreeSet};

/// Quantity checks plus unknown-name warnings for `workloadResources`
pub fn validate_workload_resources(
    workload_resources: &BTreeMap<String, Resources>,
    known_workloads: &BTreeSet<String>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (name, resources) in workload_resources {
        if !known_workloads.contains(name) {
            result.add_warning(format!("workloadResources: unknown workload '{name}'"));
        }
        result.merge(validate_resources(&format!("workloadResources.{name}"), resources));
    }
    result
}

/// Same checks for the override set
pub fn validate_override_set(
    overrides: &ResourceOverrideSet,
    known_workloads: &BTreeSet<String>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (name, workload) in &overrides.spec.workloads {
        if !known_workloads.contains(name) {
            result.add_warning(format!("ResourceOverrideSet: unknown workload '{name}'"));
        }
        result.merge(validate_resources(
            &format!("ResourceOverrideSet.workloads.{name}"),
            &workload.resources,
        ));
    }
    result
}
