use crate::crd::{ResourceQuantities, Resources};
use crate::patch::{child_object, pod_spec_mut, Patch};
use kube::api::DynamicObject;
use serde_json::{Map, Value};

/// Overwrites requests/limits of the first container, one field at a time.
///
/// Only non-empty fields in the override are written, so a memory-only
/// override keeps whatever CPU the template rendered.
#[derive(Debug, Clone)]
pub struct ContainerResources(pub Resources);

impl ContainerResources {
    /// `None` when the override sets nothing
    pub fn non_empty(resources: &Resources) -> Option<Self> {
        (!resources.is_empty()).then(|| Self(resources.clone()))
    }
}

impl Patch for ContainerResources {
    fn apply(&self, obj: &mut DynamicObject) {
        let Some(container) = pod_spec_mut(obj)
            .and_then(|spec| spec.get_mut("containers"))
            .and_then(Value::as_array_mut)
            .and_then(|containers| containers.first_mut())
            .and_then(Value::as_object_mut)
        else {
            return;
        };
        let Some(resources) = child_object(container, "resources") else {
            return;
        };
        write_quantities(resources, "requests", &self.0.requests);
        write_quantities(resources, "limits", &self.0.limits);
    }
}

fn write_quantities(resources: &mut Map<String, Value>, level: &str, quantities: &ResourceQuantities) {
    if quantities.is_empty() {
        return;
    }
    let Some(target) = child_object(resources, level) else {
        return;
    };
    for (field, value) in quantities.fields() {
        if !value.is_empty() {
            target.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::test_support::deployment;
    use serde_json::json;

    fn proxy_with_defaults() -> DynamicObject {
        deployment(
            "wavefront-proxy",
            json!({
                "name": "wavefront-proxy",
                "resources": {
                    "requests": {"cpu": "100m", "memory": "1Gi"},
                    "limits": {"cpu": "1000m", "memory": "4Gi"}
                }
            }),
        )
    }

    fn container_resources(obj: &DynamicObject) -> &Value {
        &obj.data["spec"]["template"]["spec"]["containers"][0]["resources"]
    }

    #[test]
    fn test_memory_only_override_keeps_template_cpu() {
        let mut obj = proxy_with_defaults();
        let patch = ContainerResources(Resources::new(
            ResourceQuantities::new("", "2Gi"),
            ResourceQuantities::new("", "6Gi"),
        ));
        patch.apply(&mut obj);

        let resources = container_resources(&obj);
        assert_eq!(resources["requests"]["cpu"], "100m");
        assert_eq!(resources["limits"]["cpu"], "1000m");
        assert_eq!(resources["requests"]["memory"], "2Gi");
        assert_eq!(resources["limits"]["memory"], "6Gi");
    }

    #[test]
    fn test_creates_missing_resources_block() {
        let mut obj = deployment("kelvin", json!({"name": "app"}));
        let patch = ContainerResources(Resources::new(
            ResourceQuantities::default(),
            ResourceQuantities {
                ephemeral_storage: "1Gi".to_string(),
                ..Default::default()
            },
        ));
        patch.apply(&mut obj);

        let resources = container_resources(&obj);
        assert_eq!(resources["limits"]["ephemeral-storage"], "1Gi");
        assert!(resources.get("requests").is_none());
    }

    #[test]
    fn test_resource_without_containers_is_untouched() {
        let mut obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "wavefront-proxy-config"},
            "data": {"key": "value"}
        }))
        .unwrap();
        let before = obj.data.clone();
        ContainerResources(Resources::new(
            ResourceQuantities::new("1", "1Gi"),
            ResourceQuantities::default(),
        ))
        .apply(&mut obj);
        assert_eq!(obj.data, before);
    }

    #[test]
    fn test_empty_override_is_skipped() {
        assert!(ContainerResources::non_empty(&Resources::default()).is_none());
    }
}
