//! Common test utilities
//!
//! Provides an in-memory cluster implementing `ClusterClient`, fixtures for the
//! objects every pass looks up, and a telemetry sender that records points.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::api::DynamicObject;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use wavefront_operator::cluster::{ClusterClient, ClusterError, ResourceKey};
use wavefront_operator::config::OperatorConfig;
use wavefront_operator::telemetry::{MetricSender, Point, SenderFactory, TelemetryError};

pub const NAMESPACE: &str = "observability-system";
pub const OPERATOR_UID: &str = "operator-deployment-uid";
pub const CLUSTER_UUID: &str = "2c3c4d9e-kube-system-uid";

/// In-memory cluster keyed like the API server
#[derive(Debug, Default)]
pub struct FakeClusterClient {
    objects: Mutex<BTreeMap<ResourceKey, Value>>,
    api_groups: Mutex<Vec<String>>,
    operations: Mutex<Vec<String>>,
    status_writes: Mutex<Vec<ResourceKey>>,
    failing_deletes: Mutex<usize>,
}

impl FakeClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as-is, replacing any previous one with the same key
    pub fn insert(&self, value: Value) {
        let obj: DynamicObject = serde_json::from_value(value.clone()).unwrap();
        let key = ResourceKey::of(&obj).unwrap();
        self.objects.lock().unwrap().insert(key, value);
    }

    pub fn remove(&self, key: &ResourceKey) {
        self.objects.lock().unwrap().remove(key);
    }

    pub fn object(&self, key: &ResourceKey) -> Option<Value> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Every stored key of the given kind
    pub fn keys_of_kind(&self, kind: &str) -> Vec<ResourceKey> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.kind == kind)
            .cloned()
            .collect()
    }

    pub fn set_api_groups(&self, groups: &[&str]) {
        *self.api_groups.lock().unwrap() = groups.iter().map(|g| g.to_string()).collect();
    }

    /// `create|patch|delete <key>` in call order
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    pub fn clear_operations(&self) {
        self.operations.lock().unwrap().clear();
        self.status_writes.lock().unwrap().clear();
    }

    /// Make the next `count` deletes fail as if the API server were unreachable
    pub fn fail_next_deletes(&self, count: usize) {
        *self.failing_deletes.lock().unwrap() = count;
    }

    pub fn status_writes(&self) -> Vec<ResourceKey> {
        self.status_writes.lock().unwrap().clone()
    }

    /// Merge `status` into a stored object, as the workload controllers would
    pub fn set_status(&self, key: &ResourceKey, status: Value) {
        let mut objects = self.objects.lock().unwrap();
        let obj = objects.get_mut(key).unwrap();
        obj["status"] = status;
    }

    fn record(&self, operation: &str, key: &ResourceKey) {
        self.operations
            .lock()
            .unwrap()
            .push(format!("{operation} {key}"));
    }
}

#[async_trait]
impl ClusterClient for FakeClusterClient {
    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, ClusterError> {
        let value = self.objects.lock().unwrap().get(key).cloned();
        Ok(value
            .map(serde_json::from_value::<DynamicObject>)
            .transpose()?)
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClusterError> {
        let wanted: Vec<(&str, &str)> = label_selector
            .unwrap_or_default()
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .collect();
        let objects = self.objects.lock().unwrap();
        let mut found = Vec::new();
        for (key, value) in objects.iter() {
            if key.api_version != api_version
                || key.kind != kind
                || key.namespace.as_deref() != Some(namespace)
            {
                continue;
            }
            let labels = &value["metadata"]["labels"];
            if wanted
                .iter()
                .all(|(k, v)| labels.get(*k).and_then(Value::as_str) == Some(*v))
            {
                found.push(serde_json::from_value(value.clone())?);
            }
        }
        Ok(found)
    }

    async fn create(&self, obj: &DynamicObject) -> Result<(), ClusterError> {
        let key = ResourceKey::of(obj)?;
        self.record("create", &key);
        self.objects
            .lock()
            .unwrap()
            .insert(key, serde_json::to_value(obj)?);
        Ok(())
    }

    async fn patch(&self, obj: &DynamicObject) -> Result<(), ClusterError> {
        let key = ResourceKey::of(obj)?;
        self.record("patch", &key);
        let patch = serde_json::to_value(obj)?;
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| ClusterError::NotFound(key.clone()))?;
        merge_patch(stored, &patch);
        Ok(())
    }

    async fn delete(&self, key: &ResourceKey) -> Result<(), ClusterError> {
        self.record("delete", key);
        {
            let mut failing = self.failing_deletes.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(ClusterError::Incomplete("a reachable API server"));
            }
        }
        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(ClusterError::NotFound(key.clone())),
        }
    }

    async fn patch_status(&self, key: &ResourceKey, status: Value) -> Result<(), ClusterError> {
        self.status_writes.lock().unwrap().push(key.clone());
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .get_mut(key)
            .ok_or_else(|| ClusterError::NotFound(key.clone()))?;
        merge_patch(stored, &json!({ "status": status }));
        Ok(())
    }

    async fn api_groups(&self) -> Result<Vec<String>, ClusterError> {
        Ok(self.api_groups.lock().unwrap().clone())
    }
}

/// JSON merge patch: objects merge recursively, `null` removes, anything else replaces
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(target) = target else {
        return;
    };
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// Configuration pointing at the shipped templates, telemetry off
pub fn operator_config() -> OperatorConfig {
    OperatorConfig {
        namespace: NAMESPACE.to_string(),
        template_dir: templates_dir(),
        version: "2.30.0".to_string(),
        enable_telemetry: false,
        ..Default::default()
    }
}

pub fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Cluster holding the operator Deployment, `kube-system` and a token secret
pub fn seeded_cluster() -> FakeClusterClient {
    let cluster = FakeClusterClient::new();
    cluster.insert(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": "wavefront-controller-manager",
            "namespace": NAMESPACE,
            "uid": OPERATOR_UID
        },
        "spec": {"selector": {}, "template": {}}
    }));
    cluster.insert(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {"name": "kube-system", "uid": CLUSTER_UUID}
    }));
    cluster.insert(token_secret(json!({"token": "wavefront-api-token"})));
    cluster
}

pub fn token_secret(string_data: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": "wavefront-secret", "namespace": NAMESPACE},
        "stringData": string_data
    })
}

pub fn configmap(name: &str, data: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": name, "namespace": NAMESPACE},
        "data": data
    })
}

/// A `Wavefront` document named `wavefront` created at `created`
pub fn wavefront(spec: Value, created: DateTime<Utc>) -> Value {
    json!({
        "apiVersion": "wavefront.com/v1alpha1",
        "kind": "Wavefront",
        "metadata": {
            "name": "wavefront",
            "namespace": NAMESPACE,
            "creationTimestamp": created.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        },
        "spec": spec
    })
}

pub fn basic_spec() -> Value {
    json!({
        "clusterName": "prod-cluster",
        "wavefrontUrl": "https://example.wavefront.com"
    })
}

pub fn wavefront_key() -> ResourceKey {
    ResourceKey::namespaced("wavefront.com/v1alpha1", "Wavefront", NAMESPACE, "wavefront")
}

pub fn override_set(spec: Value) -> Value {
    json!({
        "apiVersion": "wavefront.com/v1alpha1",
        "kind": "ResourceOverrideSet",
        "metadata": {"name": "resource-overrides", "namespace": NAMESPACE},
        "spec": spec
    })
}

pub fn override_set_key() -> ResourceKey {
    ResourceKey::namespaced(
        "wavefront.com/v1alpha1",
        "ResourceOverrideSet",
        NAMESPACE,
        "resource-overrides",
    )
}

pub fn workload_key(kind: &str, name: &str) -> ResourceKey {
    ResourceKey::namespaced("apps/v1", kind, NAMESPACE, name)
}

/// Report every instance of a workload as ready
pub fn mark_ready(cluster: &FakeClusterClient, kind: &str, name: &str, count: i32) {
    let status = match kind {
        "DaemonSet" => json!({
            "numberReady": count,
            "desiredNumberScheduled": count,
            "currentNumberScheduled": count,
            "numberMisscheduled": 0
        }),
        "StatefulSet" => json!({"readyReplicas": count, "replicas": count}),
        _ => json!({"availableReplicas": count, "readyReplicas": count}),
    };
    cluster.set_status(&workload_key(kind, name), status);
}

/// A pod of `component` whose only container was last terminated for `reason`
pub fn terminated_pod(name: &str, component: &str, reason: &str, finished: DateTime<Utc>) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": NAMESPACE,
            "labels": {
                "app.kubernetes.io/name": "wavefront",
                "app.kubernetes.io/component": component
            }
        },
        "status": {"containerStatuses": [{
            "name": component,
            "lastState": {"terminated": {
                "reason": reason,
                "finishedAt": finished.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            }}
        }]}
    })
}

/// Sender that keeps every point it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    pub sent: Arc<Mutex<Vec<(String, Point)>>>,
    address: String,
}

#[async_trait]
impl MetricSender for RecordingSender {
    async fn send(&self, points: &[Point]) -> Result<(), TelemetryError> {
        let mut sent = self.sent.lock().unwrap();
        sent.extend(points.iter().cloned().map(|p| (self.address.clone(), p)));
        Ok(())
    }
}

/// Factory whose senders all record into `sent`
pub fn recording_factory(sent: Arc<Mutex<Vec<(String, Point)>>>) -> SenderFactory {
    Arc::new(move |address: &str| {
        Ok(Box::new(RecordingSender {
            sent: Arc::clone(&sent),
            address: address.to_string(),
        }) as Box<dyn MetricSender>)
    })
}
