use crate::components::Workload;
use crate::crd::{ResourceOverrideSet, WavefrontSpec};
use crate::patch::{ByName, Composed, ContainerResources, Tolerations};

/// Patch applied to every resource a component applies
///
/// Order: all-workload tolerations, `workloadResources` from the desired
/// state, then override-set resources and tolerations per workload. Later
/// stages win, so the override set has the last word.
pub fn workload_patch(
    spec: &WavefrontSpec,
    overrides: Option<&ResourceOverrideSet>,
    workloads: &[Workload],
) -> Composed {
    let mut desired_resources = ByName::new();
    for workload in workloads {
        if let Some(resources) = spec.workload_resources.get(workload.name) {
            desired_resources.insert(workload.name, ContainerResources::non_empty(resources));
        }
    }

    let Some(overrides) = overrides else {
        return Composed::new().with(desired_resources);
    };

    let mut override_resources = ByName::new();
    let mut override_tolerations = ByName::new();
    for workload in workloads {
        if let Some(workload_override) = overrides.spec.workloads.get(workload.name) {
            override_resources.insert(
                workload.name,
                ContainerResources::non_empty(&workload_override.resources),
            );
            override_tolerations.insert(
                workload.name,
                Tolerations::from_override(&workload_override.tolerations),
            );
        }
    }

    Composed::new()
        .with(Tolerations::from_override(
            &overrides.spec.all_workloads.tolerations,
        ))
        .with(desired_resources)
        .with(override_resources)
        .with(override_tolerations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::WorkloadKind;
    use crate::crd::{
        ResourceOverrideSetSpec, ResourceQuantities, Resources, Toleration, TolerationOverride,
        WorkloadOverride,
    };
    use crate::patch::Patch;
    use kube::api::DynamicObject;
    use serde_json::json;

    const PROXY: [Workload; 1] = [Workload::new(WorkloadKind::Deployment, "wavefront-proxy")];

    fn proxy_deployment() -> DynamicObject {
        serde_json::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "wavefront-proxy"},
            "spec": {"template": {"spec": {"containers": [{
                "name": "wavefront-proxy",
                "resources": {
                    "requests": {"cpu": "100m", "memory": "1Gi"},
                    "limits": {"cpu": "1000m", "memory": "4Gi"}
                }
            }]}}}
        }))
        .unwrap()
    }

    fn memory_only(request: &str, limit: &str) -> Resources {
        Resources::new(
            ResourceQuantities::new("", request),
            ResourceQuantities::new("", limit),
        )
    }

    #[test]
    fn test_override_set_wins_over_desired_state() {
        let mut spec = WavefrontSpec::default();
        spec.workload_resources
            .insert("wavefront-proxy".to_string(), memory_only("2Gi", "5Gi"));
        let overrides = ResourceOverrideSet::new(
            "resource-overrides",
            ResourceOverrideSetSpec {
                workloads: [(
                    "wavefront-proxy".to_string(),
                    WorkloadOverride {
                        resources: memory_only("", "6Gi"),
                        ..Default::default()
                    },
                )]
                .into(),
                ..Default::default()
            },
        );

        let mut obj = proxy_deployment();
        workload_patch(&spec, Some(&overrides), &PROXY).apply(&mut obj);

        let resources = &obj.data["spec"]["template"]["spec"]["containers"][0]["resources"];
        assert_eq!(resources["requests"]["memory"], "2Gi");
        assert_eq!(resources["limits"]["memory"], "6Gi");
        assert_eq!(resources["requests"]["cpu"], "100m");
        assert_eq!(resources["limits"]["cpu"], "1000m");
    }

    #[test]
    fn test_all_workload_tolerations_then_per_workload_remove() {
        let gpu = Toleration {
            key: "gpu".to_string(),
            operator: "Exists".to_string(),
            ..Default::default()
        };
        let overrides = ResourceOverrideSet::new(
            "resource-overrides",
            ResourceOverrideSetSpec {
                all_workloads: crate::crd::AllWorkloadsOverride {
                    tolerations: TolerationOverride {
                        add: vec![gpu.clone()],
                        remove: vec![],
                    },
                },
                workloads: [(
                    "wavefront-proxy".to_string(),
                    WorkloadOverride {
                        tolerations: TolerationOverride {
                            add: vec![],
                            remove: vec![gpu],
                        },
                        ..Default::default()
                    },
                )]
                .into(),
            },
        );

        let mut obj = proxy_deployment();
        workload_patch(&WavefrontSpec::default(), Some(&overrides), &PROXY).apply(&mut obj);
        assert!(obj.data["spec"]["template"]["spec"].get("tolerations").is_none());
    }

    #[test]
    fn test_other_workloads_are_untouched() {
        let mut spec = WavefrontSpec::default();
        spec.workload_resources
            .insert("wavefront-logging".to_string(), memory_only("1Gi", "1Gi"));
        let mut obj = proxy_deployment();
        let before = obj.data.clone();
        workload_patch(&spec, None, &PROXY).apply(&mut obj);
        assert_eq!(obj.data, before);
    }
}
