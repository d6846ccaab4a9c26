//! # Deletion Watch
//!
//! The controller only reconciles objects still in its cache, so deletion of
//! the `Wavefront` resource is picked up here and turned into a teardown pass.

use crate::controller::backoff::ExponentialBackoff;
use crate::controller::{PassOutcome, Reconciler};
use crate::crd::Wavefront;
use crate::observability::metrics;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::{watcher, WatchStreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Spawn a background task that tears down components when a `Wavefront` is deleted
pub fn start_deletion_watch(wavefronts: Api<Wavefront>, reconciler: Arc<Reconciler>) {
    tokio::spawn(async move {
        info!("Starting watch for Wavefront deletions");
        let mut stream = watcher(wavefronts, watcher::Config::default())
            .default_backoff()
            .boxed();

        while let Some(event_result) = stream.next().await {
            match event_result {
                Ok(watcher::Event::Delete(wavefront)) => {
                    let reconciler = Arc::clone(&reconciler);
                    tokio::spawn(async move {
                        handle_delete(&reconciler, &wavefront).await;
                    });
                }
                Ok(
                    watcher::Event::Apply(_)
                    | watcher::Event::Init
                    | watcher::Event::InitApply(_)
                    | watcher::Event::InitDone,
                ) => {}
                Err(e) => {
                    // Retried by the stream backoff
                    warn!("Error watching Wavefront resources: {}", e);
                }
            }
        }

        warn!("Wavefront deletion watch stream ended");
    });
}

async fn handle_delete(reconciler: &Reconciler, wavefront: &Wavefront) {
    let name = wavefront.name_any();
    let namespace = wavefront
        .namespace()
        .unwrap_or_else(|| reconciler.config.namespace.clone());
    info!("Wavefront '{}/{}' deleted, tearing down components", namespace, name);

    let outcome = tear_down(reconciler, &namespace, &name).await;
    info!(
        deleted = outcome.deleted(),
        "🧹 Teardown complete for {}/{}",
        namespace,
        name
    );
}

/// Run the teardown pass until it succeeds
///
/// Nothing requeues a deleted `Wavefront`, so failures are retried here with
/// the configured exponential backoff.
pub async fn tear_down(reconciler: &Reconciler, namespace: &str, name: &str) -> PassOutcome {
    let mut backoff = ExponentialBackoff::new(
        reconciler.config.backoff_min_secs,
        reconciler.config.backoff_max_secs,
    );
    loop {
        metrics::increment_reconciliations();
        match reconciler.run_pass(namespace, name, chrono::Utc::now()).await {
            Ok(outcome) => return outcome,
            Err(e) => {
                metrics::increment_reconciliation_errors();
                let delay = backoff.next_backoff();
                error!(
                    retry_in_secs = delay.as_secs(),
                    "Teardown failed for {}/{}: {}", namespace, name, e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
