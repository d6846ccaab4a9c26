//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

use std::time::Duration;

/// Product name stamped on every synthesized resource
pub const PRODUCT_NAME: &str = "wavefront";

/// Label carrying the product name
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Label carrying the sub-component (template directory) name
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Annotation that forces a resource into the delete list when set to "false"
pub const CONDITIONALLY_PROVISION_ANNOTATION: &str = "wavefront.com/conditionally-provision";

/// Pod template annotation carrying a component's config hash
pub const CONFIG_HASH_ANNOTATION: &str = "wavefront.com/config-hash";

/// Default operator namespace
pub const DEFAULT_NAMESPACE: &str = "observability-system";

/// Default name of the operator's own Deployment (owner of everything we create)
pub const DEFAULT_OPERATOR_DEPLOYMENT_NAME: &str = "wavefront-controller-manager";

/// Default template root inside the operator image
pub const DEFAULT_TEMPLATE_DIR: &str = "/templates";

/// Default image registry for component images
pub const DEFAULT_IMAGE_REGISTRY: &str = "projects.registry.vmware.com/tanzu_observability";

/// Name of the singleton override set
pub const RESOURCE_OVERRIDES_NAME: &str = "resource-overrides";

/// Default token secret name
pub const DEFAULT_TOKEN_SECRET: &str = "wavefront-secret";

/// Key in the user rule ConfigMap holding the rule document
pub const PREPROCESSOR_RULES_KEY: &str = "rules.yaml";

/// Scope key in the user rule document that applies to every port
pub const GLOBAL_RULES_SCOPE: &str = "global";

/// Tags reserved for the operator's own identity tagging
pub const RESERVED_IDENTITY_TAGS: [&str; 2] = ["cluster", "cluster_uuid"];

/// API group whose presence marks an OpenShift cluster
pub const OPENSHIFT_API_GROUP: &str = "config.openshift.io";

/// Namespace whose UID identifies the cluster
pub const CLUSTER_IDENTITY_NAMESPACE: &str = "kube-system";

/// Lookback window for OOM-kill detection
pub const OOM_LOOKBACK: Duration = Duration::from_secs(5 * 60);

/// Grace period after creation during which failures report as installing
pub const INSTALL_GRACE_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default periodic requeue interval (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;

/// Default minimum error backoff (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum error backoff (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "wavefront-operator";

/// Component image versions
pub const PROXY_VERSION: &str = "13.4";
pub const COLLECTOR_VERSION: &str = "1.29.0";
pub const LOGGING_VERSION: &str = "1.16.2-1.1";
pub const PIXIE_VERSION: &str = "0.14.8";
