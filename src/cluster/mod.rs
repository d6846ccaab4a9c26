//! # Cluster Client
//!
//! The operator talks to the API server only through [`ClusterClient`], so the
//! reconciliation pipeline can run against an in-memory cluster in tests.
//!
//! Every object crosses this boundary as a [`DynamicObject`]; typed views are
//! produced with [`parse`] where the pipeline needs them.

mod kube_client;

pub use kube_client::KubeClusterClient;

use async_trait::async_trait;
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{0} not found")]
    NotFound(ResourceKey),
    #[error("no matching kind for {api_version}/{kind}")]
    NoMatchingKind { api_version: String, kind: String },
    #[error("resource is missing {0}")]
    Incomplete(&'static str),
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
    #[error("failed to convert resource: {0}")]
    Convert(#[from] serde_json::Error),
}

impl ClusterError {
    /// Errors a delete treats as "already gone"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            ClusterError::NotFound(_) | ClusterError::NoMatchingKind { .. } => true,
            ClusterError::Api(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

/// Identity of one object in the cluster
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceKey {
    pub fn namespaced(api_version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
        }
    }

    pub fn cluster_scoped(api_version: &str, kind: &str, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: None,
            name: name.to_string(),
        }
    }

    /// Key of an already-decoded object
    pub fn of(obj: &DynamicObject) -> Result<Self, ClusterError> {
        let types = obj
            .types
            .as_ref()
            .ok_or(ClusterError::Incomplete("apiVersion/kind"))?;
        let name = obj
            .metadata
            .name
            .clone()
            .ok_or(ClusterError::Incomplete("metadata.name"))?;
        Ok(Self {
            api_version: types.api_version.clone(),
            kind: types.kind.clone(),
            namespace: obj.metadata.namespace.clone(),
            name,
        })
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{} {}/{}", self.kind, namespace, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Cluster API operations the pipeline needs
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch one object; `Ok(None)` when it does not exist
    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, ClusterError>;

    /// List objects of a kind in a namespace, optionally filtered by label selector
    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClusterError>;

    async fn create(&self, obj: &DynamicObject) -> Result<(), ClusterError>;

    /// JSON merge-patch the object with itself
    async fn patch(&self, obj: &DynamicObject) -> Result<(), ClusterError>;

    /// Delete by reference; not-found and unknown kinds are not errors
    async fn delete(&self, key: &ResourceKey) -> Result<(), ClusterError>;

    /// Merge-patch the status subresource
    async fn patch_status(
        &self,
        key: &ResourceKey,
        status: serde_json::Value,
    ) -> Result<(), ClusterError>;

    /// Names of every installed API group
    async fn api_groups(&self) -> Result<Vec<String>, ClusterError>;
}

/// Convert a dynamic object into a typed resource
pub fn parse<K: DeserializeOwned>(obj: DynamicObject) -> Result<K, ClusterError> {
    Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
}

/// Fetch and convert in one step
pub async fn get_typed<K: DeserializeOwned>(
    client: &dyn ClusterClient,
    key: &ResourceKey,
) -> Result<Option<K>, ClusterError> {
    client.get(key).await?.map(parse).transpose()
}
