use crate::crd::{Toleration, TolerationOverride};
use crate::patch::{pod_spec_mut, Patch};
use kube::api::DynamicObject;
use serde_json::Value;

/// Adds and removes pod tolerations by canonical form.
///
/// Adds are applied first and skip tolerations already present; removes then
/// drop every exact canonical match. All-empty tolerations are ignored.
///
/// A list emptied by removes is kept as `[]` so a merge patch clears the live
/// field; a list that was never populated is left out.
#[derive(Debug, Clone)]
pub struct Tolerations {
    add: Vec<Value>,
    remove: Vec<Value>,
}

impl Tolerations {
    pub fn new(add: &[Toleration], remove: &[Toleration]) -> Self {
        Self {
            add: add.iter().filter_map(to_value).collect(),
            remove: remove.iter().filter_map(to_value).collect(),
        }
    }

    /// `None` when the override adds and removes nothing
    pub fn from_override(overrides: &TolerationOverride) -> Option<Self> {
        let patch = Self::new(&overrides.add, &overrides.remove);
        (!patch.add.is_empty() || !patch.remove.is_empty()).then_some(patch)
    }
}

fn to_value(toleration: &Toleration) -> Option<Value> {
    let value = serde_json::to_value(toleration).ok()?;
    (!canonical_form(&value).is_empty()).then_some(value)
}

/// Sorted `field=value` pairs over non-empty fields, joined with `,`
pub fn canonical_form(toleration: &Value) -> String {
    let Some(fields) = toleration.as_object() else {
        return String::new();
    };
    let mut pairs: Vec<String> = fields
        .iter()
        .filter_map(|(field, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (!rendered.is_empty()).then(|| format!("{field}={rendered}"))
        })
        .collect();
    pairs.sort();
    pairs.join(",")
}

impl Patch for Tolerations {
    fn apply(&self, obj: &mut DynamicObject) {
        let Some(pod_spec) = pod_spec_mut(obj) else {
            return;
        };
        let entry = pod_spec
            .entry("tolerations".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }
        let Some(existing) = entry.as_array_mut() else {
            return;
        };

        for toleration in &self.add {
            let canonical = canonical_form(toleration);
            if !existing.iter().any(|t| canonical_form(t) == canonical) {
                existing.push(toleration.clone());
            }
        }
        let populated = !existing.is_empty();
        for toleration in &self.remove {
            let canonical = canonical_form(toleration);
            existing.retain(|t| canonical_form(t) != canonical);
        }

        if !populated {
            pod_spec.remove("tolerations");
        }
    }
}
