//! # Preprocessor
//!
//! Derives everything the desired-state document cannot state directly and
//! writes it into `spec.derived`. Runs at the start of every pass and starts
//! from a blank derived block, so repeated runs over the same cluster state
//! produce the same result.
//!
//! ## Module Structure
//!
//! - `ports.rs` - Proxy listener port enumeration
//! - `rules.rs` - User preprocessor rule parsing and reserved-tag checks
//! - `auth.rs` - Token secret auth-mode detection
//! - `http_proxy.rs` - Outbound HTTP proxy settings
//! - `hash.rs` - Config hashes that trigger rollouts
//! - `normalize.rs` - Request defaulting in resource blocks

mod auth;
mod hash;
mod http_proxy;
mod normalize;
mod ports;
mod rules;

pub use auth::detect_auth_mode;
pub use hash::config_hash;
pub use http_proxy::parse_http_proxy;
pub use normalize::normalize_resources;
pub use ports::{enabled_ports, listener_ports};
pub use rules::{parse_user_rules, RuleScope, UserRules};

use crate::cluster::{get_typed, ClusterClient, ClusterError, ResourceKey};
use crate::config::OperatorConfig;
use crate::constants::{CLUSTER_IDENTITY_NAMESPACE, OPENSHIFT_API_GROUP};
use crate::crd::{Derived, Wavefront};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// User configuration the operator cannot act on
#[derive(Debug, Error)]
pub enum InvalidConfig {
    #[error(
        "Invalid rule configured in ConfigMap '{configmap}' on port '{port}', overriding {scope} tag '{tag}' is disallowed"
    )]
    DisallowedTag {
        configmap: String,
        port: String,
        scope: RuleScope,
        tag: String,
    },
    #[error("Invalid preprocessor rules in ConfigMap '{configmap}': {reason}")]
    MalformedRules { configmap: String, reason: String },
    #[error("Invalid authentication configured in Secret '{secret}': {reason}")]
    Auth { secret: String, reason: String },
    #[error("Invalid HTTP proxy configured in Secret '{secret}': {reason}")]
    HttpProxy { secret: String, reason: String },
    #[error("Secret '{0}' not found")]
    MissingSecret(String),
    #[error("ConfigMap '{0}' not found")]
    MissingConfigMap(String),
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Reported as a validation failure
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
    /// Fails the pass
    #[error("cluster lookup failed during preprocessing: {0}")]
    Cluster(#[from] ClusterError),
}

impl From<serde_json::Error> for PreprocessError {
    fn from(e: serde_json::Error) -> Self {
        PreprocessError::Cluster(ClusterError::Convert(e))
    }
}

/// Fill in `spec.derived` and normalize resource blocks in place
pub async fn preprocess(
    client: &dyn ClusterClient,
    wavefront: &mut Wavefront,
    config: &OperatorConfig,
) -> Result<(), PreprocessError> {
    let spec = &mut wavefront.spec;
    spec.derived = Derived {
        namespace: config.namespace.clone(),
        operator_version: config.version.clone(),
        image_registry: config.image_registry.clone(),
        ..Default::default()
    };

    spec.derived.cluster_uuid = cluster_uuid(client).await?;
    spec.derived.openshift = client
        .api_groups()
        .await?
        .iter()
        .any(|group| group == OPENSHIFT_API_GROUP);

    normalize_resources(spec);

    if spec.proxy_enabled() {
        let proxy = &spec.data_export.wavefront_proxy;
        let namespace = config.namespace.as_str();
        spec.derived.proxy_address = format!("wavefront-proxy:{}", proxy.metric_port);
        spec.derived.proxy.enabled_ports = enabled_ports(proxy);

        let token_data = secret_data(client, namespace, &spec.wavefront_token_secret)
            .await?
            .ok_or_else(|| InvalidConfig::MissingSecret(spec.wavefront_token_secret.clone()))?;
        let auth = detect_auth_mode(&spec.wavefront_token_secret, &token_data)?;

        let mut http_proxy_data = BTreeMap::new();
        if !proxy.http_proxy.secret.is_empty() {
            http_proxy_data = secret_data(client, namespace, &proxy.http_proxy.secret)
                .await?
                .ok_or_else(|| InvalidConfig::MissingSecret(proxy.http_proxy.secret.clone()))?;
            spec.derived.proxy.http_proxy =
                Some(parse_http_proxy(&proxy.http_proxy.secret, &http_proxy_data)?);
        }

        if !proxy.preprocessor.is_empty() {
            let data = configmap_data(client, namespace, &proxy.preprocessor)
                .await?
                .ok_or_else(|| InvalidConfig::MissingConfigMap(proxy.preprocessor.clone()))?;
            let rules = parse_user_rules(&proxy.preprocessor, &data)?;
            spec.derived.proxy.port_rules = rules.port_rules;
            spec.derived.proxy.global_rules = rules.global_rules;
        }

        spec.derived.proxy.config_hash = config_hash(&(
            &token_data,
            auth.as_str(),
            &http_proxy_data,
        ))?;
        spec.derived.proxy.auth = Some(auth);
    } else {
        spec.derived.proxy_address = spec.data_export.external_wavefront_proxy.url.clone();
    }

    let metrics = &spec.data_collection.metrics;
    if metrics.enable && !metrics.custom_config.is_empty() {
        let data = configmap_data(client, &config.namespace, &metrics.custom_config)
            .await?
            .ok_or_else(|| InvalidConfig::MissingConfigMap(metrics.custom_config.clone()))?;
        spec.derived.collector_config_hash = config_hash(&data)?;
    }

    debug!(
        cluster_uuid = %spec.derived.cluster_uuid,
        openshift = spec.derived.openshift,
        proxy_address = %spec.derived.proxy_address,
        "preprocessed desired state"
    );
    Ok(())
}

async fn cluster_uuid(client: &dyn ClusterClient) -> Result<String, ClusterError> {
    let key = ResourceKey::cluster_scoped("v1", "Namespace", CLUSTER_IDENTITY_NAMESPACE);
    let namespace: Namespace = get_typed(client, &key)
        .await?
        .ok_or_else(|| ClusterError::NotFound(key.clone()))?;
    namespace
        .metadata
        .uid
        .ok_or(ClusterError::Incomplete("metadata.uid"))
}

/// Secret data decoded to strings; `None` when the secret does not exist
async fn secret_data(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
) -> Result<Option<BTreeMap<String, String>>, ClusterError> {
    let key = ResourceKey::namespaced("v1", "Secret", namespace, name);
    let Some(secret) = get_typed::<Secret>(client, &key).await? else {
        return Ok(None);
    };
    let mut data: BTreeMap<String, String> = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, String::from_utf8_lossy(&v.0).into_owned()))
        .collect();
    data.extend(secret.string_data.unwrap_or_default());
    Ok(Some(data))
}

async fn configmap_data(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
) -> Result<Option<BTreeMap<String, String>>, ClusterError> {
    let key = ResourceKey::namespaced("v1", "ConfigMap", namespace, name);
    Ok(get_typed::<ConfigMap>(client, &key)
        .await?
        .map(|configmap| configmap.data.unwrap_or_default()))
}
