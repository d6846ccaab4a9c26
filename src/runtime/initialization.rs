//! # Initialization
//!
//! Operator initialization: rustls setup, tracing, metrics, server startup,
//! and Kubernetes client setup.

use crate::cluster::{ClusterClient, KubeClusterClient};
use crate::config::OperatorConfig;
use crate::controller::Reconciler;
use crate::crd::{ResourceOverrideSet, Wavefront};
use crate::observability;
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    /// `Wavefront` resources in the operator namespace
    pub wavefronts: Api<Wavefront>,
    /// `ResourceOverrideSet` resources in the operator namespace
    pub overrides: Api<ResourceOverrideSet>,
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the operator runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Reconciler setup
pub async fn initialize(config: OperatorConfig) -> Result<InitializationResult> {
    // Required for rustls 0.23+ before any TLS connection is made; an already
    // installed provider is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    observability::logging::init_logging(&config)?;

    info!("Starting Wavefront operator {}", config.version);
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        namespace = %config.namespace,
        template_dir = %config.template_dir.display(),
        reconcile_interval_secs = config.reconcile_interval_secs,
        "operator configuration loaded"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let wavefronts: Api<Wavefront> = Api::namespaced(client.clone(), &config.namespace);
    let overrides: Api<ResourceOverrideSet> = Api::namespaced(client.clone(), &config.namespace);

    let cluster: Arc<dyn ClusterClient> = Arc::new(KubeClusterClient::new(client.clone()));
    let reconciler = Arc::new(Reconciler::new(cluster, config));

    server_state.set_ready(true);
    info!("Operator initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        wavefronts,
        overrides,
        reconciler,
        server_state,
    })
}
