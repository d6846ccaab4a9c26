//! # Kubernetes Client
//!
//! [`ClusterClient`] backed by a real API server. Kinds are resolved through
//! discovery per call, so templates may use any installed kind, including CRDs.

use crate::cluster::{ClusterClient, ClusterError, ResourceKey};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::core::GroupVersionKind;
use kube::discovery::{self, Scope};
use kube::Client;
use tracing::debug;

#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn api_for(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Api<DynamicObject>, ClusterError> {
        let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
        let gvk = GroupVersionKind::gvk(group, version, kind);

        let (resource, capabilities) = match discovery::pinned_kind(&self.client, &gvk).await {
            Ok(found) => found,
            Err(kube::Error::Discovery(_)) => {
                return Err(ClusterError::NoMatchingKind {
                    api_version: api_version.to_string(),
                    kind: kind.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        match (capabilities.scope, namespace) {
            (Scope::Namespaced, Some(namespace)) => Ok(Api::namespaced_with(
                self.client.clone(),
                namespace,
                &resource,
            )),
            (Scope::Namespaced, None) => Err(ClusterError::Incomplete("metadata.namespace")),
            (Scope::Cluster, _) => Ok(Api::all_with(self.client.clone(), &resource)),
        }
    }

    async fn api_for_key(&self, key: &ResourceKey) -> Result<Api<DynamicObject>, ClusterError> {
        self.api_for(&key.api_version, &key.kind, key.namespace.as_deref())
            .await
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, ClusterError> {
        let api = match self.api_for_key(key).await {
            Ok(api) => api,
            Err(ClusterError::NoMatchingKind { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(api.get_opt(&key.name).await?)
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClusterError> {
        let api = self.api_for(api_version, kind, Some(namespace)).await?;
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        Ok(api.list(&params).await?.items)
    }

    async fn create(&self, obj: &DynamicObject) -> Result<(), ClusterError> {
        let key = ResourceKey::of(obj)?;
        let api = self.api_for_key(&key).await?;
        api.create(&PostParams::default(), obj).await?;
        debug!(resource = %key, "created");
        Ok(())
    }

    async fn patch(&self, obj: &DynamicObject) -> Result<(), ClusterError> {
        let key = ResourceKey::of(obj)?;
        let api = self.api_for_key(&key).await?;
        api.patch(&key.name, &PatchParams::default(), &Patch::Merge(obj))
            .await?;
        debug!(resource = %key, "patched");
        Ok(())
    }

    async fn delete(&self, key: &ResourceKey) -> Result<(), ClusterError> {
        let api = match self.api_for_key(key).await {
            Ok(api) => api,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        match api.delete(&key.name, &DeleteParams::background()).await {
            Ok(_) => {
                debug!(resource = %key, "deleted");
                Ok(())
            }
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn patch_status(
        &self,
        key: &ResourceKey,
        status: serde_json::Value,
    ) -> Result<(), ClusterError> {
        let api = self.api_for_key(key).await?;
        let patch = serde_json::json!({ "status": status });
        api.patch_status(
            &key.name,
            &PatchParams::apply(crate::constants::FIELD_MANAGER),
            &Patch::Merge(&patch),
        )
        .await?;
        Ok(())
    }

    async fn api_groups(&self) -> Result<Vec<String>, ClusterError> {
        let groups = self.client.list_api_groups().await?;
        Ok(groups.groups.into_iter().map(|group| group.name).collect())
    }
}
