//! # Operator Configuration
//!
//! Operator-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_IMAGE_REGISTRY,
    DEFAULT_METRICS_PORT, DEFAULT_NAMESPACE, DEFAULT_OPERATOR_DEPLOYMENT_NAME,
    DEFAULT_RECONCILE_INTERVAL_SECS, DEFAULT_TEMPLATE_DIR, DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::path::PathBuf;
use std::time::Duration;

/// Operator-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// The deployment manifest populates them through `env` and the downward API.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Namespace the operator (and every component it installs) runs in
    pub namespace: String,
    /// Name of the operator's own Deployment; its UID owns every synthesized resource
    pub deployment_name: String,
    /// Operator version reported in status telemetry and rendered into templates
    pub version: String,
    /// Root of the template tree, one subdirectory per component
    pub template_dir: PathBuf,
    /// Registry prefix for component images
    pub image_registry: String,
    /// Periodic requeue interval after a successful pass (seconds)
    pub reconcile_interval_secs: u64,
    /// Minimum error backoff (seconds)
    pub backoff_min_secs: u64,
    /// Maximum error backoff (seconds)
    pub backoff_max_secs: u64,
    /// Delay before restarting the watch stream after it ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Port for the metrics and probe server
    pub metrics_port: u16,
    /// Global log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Send status telemetry through the proxy
    pub enable_telemetry: bool,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            deployment_name: DEFAULT_OPERATOR_DEPLOYMENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            image_registry: DEFAULT_IMAGE_REGISTRY.to_string(),
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            enable_telemetry: true,
        }
    }
}

impl OperatorConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env_var_or_default_str("POD_NAMESPACE", &defaults.namespace),
            deployment_name: env_var_or_default_str(
                "OPERATOR_DEPLOYMENT_NAME",
                &defaults.deployment_name,
            ),
            version: env_var_or_default_str("OPERATOR_VERSION", &defaults.version),
            template_dir: PathBuf::from(env_var_or_default_str(
                "TEMPLATE_DIR",
                DEFAULT_TEMPLATE_DIR,
            )),
            image_registry: env_var_or_default_str("IMAGE_REGISTRY", &defaults.image_registry),
            reconcile_interval_secs: env_var_or_default(
                "RECONCILE_INTERVAL_SECS",
                defaults.reconcile_interval_secs,
            ),
            backoff_min_secs: env_var_or_default("BACKOFF_MIN_SECS", defaults.backoff_min_secs),
            backoff_max_secs: env_var_or_default("BACKOFF_MAX_SECS", defaults.backoff_max_secs),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                defaults.watch_restart_delay_secs,
            ),
            metrics_port: env_var_or_default("METRICS_PORT", defaults.metrics_port),
            log_level: env_var_or_default_str("LOG_LEVEL", &defaults.log_level),
            log_format: env_var_or_default_str("LOG_FORMAT", &defaults.log_format),
            enable_telemetry: env_var_or_default_bool("ENABLE_TELEMETRY", defaults.enable_telemetry),
        }
    }

    /// Get the periodic requeue duration
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    /// Get the watch restart delay duration
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OperatorConfig::default();
        assert_eq!(config.namespace, "observability-system");
        assert_eq!(config.deployment_name, "wavefront-controller-manager");
        assert_eq!(config.reconcile_interval(), Duration::from_secs(60));
        assert!(config.backoff_min_secs < config.backoff_max_secs);
    }

    #[test]
    fn test_env_var_parsing_falls_back_on_garbage() {
        assert_eq!(env_var_or_default("WAVEFRONT_OPERATOR_TEST_UNSET_KEY", 42u64), 42);
        assert!(env_var_or_default_bool("WAVEFRONT_OPERATOR_TEST_UNSET_KEY", true));
    }
}
