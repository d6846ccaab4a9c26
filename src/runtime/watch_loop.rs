//! # Watch Loop
//!
//! Controller watch loop that monitors `Wavefront` resources and triggers
//! reconciliation when they, or the `ResourceOverrideSet`, change.

use crate::controller::{reconcile, Reconciler};
use crate::crd::{ResourceOverrideSet, Wavefront};
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use crate::server::ServerState;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// First delay when the API server throttles the watch
const WATCH_BACKOFF_START_MS: u64 = 1000;

/// Run the controller watch loop
///
/// Handles graceful shutdown and restarts the controller when its stream ends.
pub async fn run_watch_loop(
    wavefronts: Api<Wavefront>,
    overrides: Api<ResourceOverrideSet>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let watch_restart_delay = reconciler.config.watch_restart_delay();
    let max_backoff_ms = reconciler.config.backoff_max_secs.saturating_mul(1000);
    let backoff_duration_ms = Arc::new(AtomicU64::new(WATCH_BACKOFF_START_MS));

    // Mark server as not ready when SIGTERM/SIGINT is received
    let shutdown_server_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_server_state.set_ready(false);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    loop {
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );
        let _watch_guard = watch_span.enter();

        info!("Starting controller watch loop...");
        let controller = Controller::new(wavefronts.clone(), watcher::Config::default().any_semantic());
        let store = controller.store();
        let backoff = Arc::clone(&backoff_duration_ms);
        let restart_delay_secs = watch_restart_delay.as_secs();

        controller
            // Any change to the override set re-reconciles every known Wavefront
            .watches(overrides.clone(), watcher::Config::default(), move |_: ResourceOverrideSet| {
                store
                    .state()
                    .into_iter()
                    .map(|wavefront| ObjectRef::from_obj(wavefront.as_ref()))
                    .collect::<Vec<_>>()
            })
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .filter_map(move |x| {
                let backoff = Arc::clone(&backoff);
                async move {
                    match &x {
                        Ok(_) => {
                            backoff.store(WATCH_BACKOFF_START_MS, Ordering::Relaxed);
                            debug!("watch.event.success");
                            Some(x)
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                max_backoff_ms,
                                restart_delay_secs,
                            )
                            .await
                            .map(|()| x)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()))
            .await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay_secs
        );
        tokio::time::sleep(watch_restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
