//! # Derived State
//!
//! Values the desired-state document cannot express directly. The preprocessor
//! recomputes all of them on every pass; none are persisted.

use serde::Serialize;
use std::collections::BTreeMap;

/// How the proxy authenticates against Wavefront
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Classic API token (`token` key)
    ApiToken,
    /// CSP API token (`csp-api-token` key)
    CspApiToken,
    /// CSP server-to-server OAuth app (`csp-app-id` + `csp-app-secret` keys)
    CspAppOAuth,
}

impl AuthMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::ApiToken => "api-token",
            AuthMode::CspApiToken => "csp-api-token",
            AuthMode::CspAppOAuth => "csp-app-oauth",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpProxySettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub use_ca_bundle: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DerivedProxy {
    /// Comma separated, de-duplicated, non-zero listener ports
    pub enabled_ports: String,
    /// User preprocessor rules keyed by port, `global` split out
    pub port_rules: BTreeMap<String, Vec<serde_json::Value>>,
    /// User preprocessor rules applied to every port
    pub global_rules: Vec<serde_json::Value>,
    pub auth: Option<AuthMode>,
    pub config_hash: String,
    pub http_proxy: Option<HttpProxySettings>,
}

#[derive(Debug, Clone, Default)]
pub struct Derived {
    pub cluster_uuid: String,
    pub namespace: String,
    pub operator_version: String,
    pub image_registry: String,
    pub openshift: bool,
    /// host:port every data-sending component targets
    pub proxy_address: String,
    pub proxy: DerivedProxy,
    /// Hash of the custom collector ConfigMap, empty when none is configured
    pub collector_config_hash: String,
}
