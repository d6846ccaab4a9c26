//! # Types
//!
//! Core types for the reconciler.

use crate::cluster::{ClusterClient, ClusterError};
use crate::config::OperatorConfig;
use crate::controller::backoff::ExponentialBackoff;
use crate::crd::WavefrontStatus;
use crate::synthesis::SynthesisError;
use crate::telemetry::TelemetryConnection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Cluster operation failed: {0}")]
    Cluster(#[from] ClusterError),
    #[error("Resource synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: ExponentialBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            backoff: ExponentialBackoff::new(min_seconds, max_seconds),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// What one pass did
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// The desired state exists; its objects were applied or deleted and status computed
    Reconciled {
        status: WavefrontStatus,
        applied: usize,
        deleted: usize,
    },
    /// The desired state is gone; every component was torn down
    TornDown { deleted: usize },
}

impl PassOutcome {
    #[must_use]
    pub fn deleted(&self) -> usize {
        match self {
            PassOutcome::Reconciled { deleted, .. } | PassOutcome::TornDown { deleted } => *deleted,
        }
    }
}

/// Shared context for every pass
pub struct Reconciler {
    pub client: Arc<dyn ClusterClient>,
    pub config: OperatorConfig,
    // The only state carried between passes besides backoff
    pub telemetry: AsyncMutex<TelemetryConnection>,
    // Backoff state per resource (identified by namespace/name)
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Arc<dyn ClusterClient>, config: OperatorConfig) -> Self {
        Self::with_telemetry(client, config, TelemetryConnection::http())
    }

    pub fn with_telemetry(
        client: Arc<dyn ClusterClient>,
        config: OperatorConfig,
        telemetry: TelemetryConnection,
    ) -> Self {
        Self {
            client,
            config,
            telemetry: AsyncMutex::new(telemetry),
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record one failure for `resource_key` and return (delay seconds, error count)
    pub fn next_backoff(&self, resource_key: &str) -> Option<(u64, u32)> {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(resource_key.to_string()).or_insert_with(|| {
                    BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
                });
                state.increment_error();
                Some((state.backoff.next_backoff_seconds(), state.error_count))
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}", e);
                None
            }
        }
    }

    /// Forget accumulated failures after a successful pass
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }
}
