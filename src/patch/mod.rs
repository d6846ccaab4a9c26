//! # Patch Engine
//!
//! Composable mutators over one synthesized resource.
//!
//! ## Module Structure
//!
//! - `resources.rs` - Container resource requests/limits on the first container
//! - `tolerations.rs` - Pod toleration add/remove with canonical-form dedup
//!
//! A pass builds one [`Patch`] per component and runs it over every resource
//! headed for apply. Mutations are ordered: later patches win.

mod resources;
mod tolerations;

pub use resources::ContainerResources;
pub use tolerations::{canonical_form, Tolerations};

use kube::api::DynamicObject;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single mutation applied to a synthesized resource
pub trait Patch: Send + Sync {
    fn apply(&self, obj: &mut DynamicObject);
}

impl<P: Patch + ?Sized> Patch for Box<P> {
    fn apply(&self, obj: &mut DynamicObject) {
        (**self).apply(obj);
    }
}

/// `None` is a no-op, so optional mutations compose without branching
impl<P: Patch> Patch for Option<P> {
    fn apply(&self, obj: &mut DynamicObject) {
        if let Some(patch) = self {
            patch.apply(obj);
        }
    }
}

/// Wraps a plain function as a patch
pub struct ApplyFn<F>(pub F);

impl<F> Patch for ApplyFn<F>
where
    F: Fn(&mut DynamicObject) + Send + Sync,
{
    fn apply(&self, obj: &mut DynamicObject) {
        (self.0)(obj);
    }
}

impl<F> fmt::Debug for ApplyFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApplyFn")
    }
}

/// Runs patches in order
#[derive(Default)]
pub struct Composed(Vec<Box<dyn Patch>>);

impl Composed {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, patch: impl Patch + 'static) -> Self {
        self.push(patch);
        self
    }

    pub fn push(&mut self, patch: impl Patch + 'static) {
        self.0.push(Box::new(patch));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Patch for Composed {
    fn apply(&self, obj: &mut DynamicObject) {
        for patch in &self.0 {
            patch.apply(obj);
        }
    }
}

impl fmt::Debug for Composed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Composed").field(&self.0.len()).finish()
    }
}

/// Applies the patch registered under the resource's `metadata.name`, if any
#[derive(Default)]
pub struct ByName(BTreeMap<String, Box<dyn Patch>>);

impl ByName {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a patch for one resource name. A second registration for the
    /// same name runs after the first.
    pub fn insert(&mut self, name: impl Into<String>, patch: impl Patch + 'static) {
        let name = name.into();
        match self.0.remove(&name) {
            Some(existing) => {
                let composed = Composed(vec![existing]).with(patch);
                self.0.insert(name, Box::new(composed));
            }
            None => {
                self.0.insert(name, Box::new(patch));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Patch for ByName {
    fn apply(&self, obj: &mut DynamicObject) {
        let Some(name) = obj.metadata.name.as_deref() else {
            return;
        };
        if let Some(patch) = self.0.get(name) {
            patch.apply(obj);
        }
    }
}

impl fmt::Debug for ByName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Pod spec of a workload (`spec.template.spec`), when present
pub(crate) fn pod_spec_mut(obj: &mut DynamicObject) -> Option<&mut Map<String, Value>> {
    obj.data
        .get_mut("spec")?
        .get_mut("template")?
        .get_mut("spec")?
        .as_object_mut()
}

/// Child object under `key`, created when missing or null
pub(crate) fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let entry = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut()
}


#[cfg(test)]
mod tests {
    use super::test_support::deployment;
    use super::*;

    fn set_label(key: &'static str, value: &'static str) -> ApplyFn<impl Fn(&mut DynamicObject) + Send + Sync> {
        ApplyFn(move |obj: &mut DynamicObject| {
            obj.metadata
                .labels
                .get_or_insert_with(Default::default)
                .insert(key.to_string(), value.to_string());
        })
    }

    #[test]
    fn test_composed_runs_in_order() {
        let patch = Composed::new()
            .with(set_label("order", "first"))
            .with(set_label("order", "second"));
        let mut obj = deployment("wavefront-proxy", serde_json::json!({"name": "proxy"}));
        patch.apply(&mut obj);
        assert_eq!(obj.metadata.labels.unwrap()["order"], "second");
    }

    #[test]
    fn test_none_is_noop() {
        let patch = Composed::new()
            .with(None::<ContainerResources>)
            .with(Some(set_label("touched", "yes")));
        let mut obj = deployment("wavefront-proxy", serde_json::json!({"name": "proxy"}));
        patch.apply(&mut obj);
        assert_eq!(obj.metadata.labels.unwrap().len(), 1);
    }

    #[test]
    fn test_by_name_only_matches_registered_resource() {
        let mut by_name = ByName::new();
        by_name.insert("wavefront-proxy", set_label("patched", "true"));

        let mut proxy = deployment("wavefront-proxy", serde_json::json!({"name": "proxy"}));
        let mut other = deployment("kelvin", serde_json::json!({"name": "app"}));
        by_name.apply(&mut proxy);
        by_name.apply(&mut other);

        assert!(proxy.metadata.labels.is_some());
        assert!(other.metadata.labels.is_none());
    }

    #[test]
    fn test_by_name_second_registration_runs_after_first() {
        let mut by_name = ByName::new();
        by_name.insert("wavefront-proxy", set_label("order", "first"));
        by_name.insert("wavefront-proxy", set_label("order", "second"));

        let mut proxy = deployment("wavefront-proxy", serde_json::json!({"name": "proxy"}));
        by_name.apply(&mut proxy);
        assert_eq!(proxy.metadata.labels.unwrap()["order"], "second");
    }
}
