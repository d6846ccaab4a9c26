//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::{Reconciler, ReconcilerError};
use crate::crd::Wavefront;
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle reconciliation errors with exponential backoff
///
/// Backoff state is tracked per resource so one failing resource never delays
/// another.
pub fn handle_reconciliation_error(
    obj: Arc<Wavefront>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| ctx.config.namespace.clone());

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {:?}", name, error);
    metrics::increment_reconciliation_errors();

    let resource_key = format!("{}/{}", namespace, name);
    let (backoff_seconds, error_count) = ctx
        .next_backoff(&resource_key)
        .unwrap_or((ctx.config.backoff_min_secs, 0));

    let next_trigger_time = chrono::Utc::now() + chrono::Duration::seconds(backoff_seconds as i64);

    info!(
        "🔄 Retrying with exponential backoff: {}s (error count: {}, trigger source: error-backoff)",
        backoff_seconds, error_count
    );
    info!(
        "📅 Next retry scheduled: {} (in {}s, trigger source: error-backoff)",
        next_trigger_time.to_rfc3339(),
        backoff_seconds
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// How a watch stream error should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    Unauthorized,
    Expired,
    Throttled,
    NotFound,
    Other,
}

impl WatchErrorKind {
    /// Classify an error by its debug rendering
    ///
    /// 404 is checked before 401: a plain-text 404 body surfaces as a decode
    /// error that also mentions `WatchFailed`.
    pub fn classify(error_string: &str) -> Self {
        let is_not_found = error_string.contains("ObjectNotFound")
            || error_string.contains("404")
            || error_string.contains("not found");
        if (error_string.contains("401") || error_string.contains("Unauthorized")) && !is_not_found
        {
            WatchErrorKind::Unauthorized
        } else if error_string.contains("410")
            || error_string.contains("too old resource version")
            || error_string.contains("Expired")
            || error_string.contains("Gone")
        {
            WatchErrorKind::Expired
        } else if error_string.contains("429")
            || error_string.contains("storage is (re)initializing")
            || error_string.contains("TooManyRequests")
        {
            WatchErrorKind::Throttled
        } else if is_not_found {
            WatchErrorKind::NotFound
        } else {
            WatchErrorKind::Other
        }
    }
}

/// Handle watch stream errors with appropriate classification and backoff
///
/// Returns `None` to filter out the error (allow restart) or `Some(())` to continue.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &Arc<AtomicU64>,
    max_backoff_ms: u64,
    watch_restart_delay_secs: u64,
) -> Option<()> {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );
    let _error_guard = error_span.enter();

    match WatchErrorKind::classify(error_string) {
        WatchErrorKind::Unauthorized => {
            error!(
                "❌ Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired"
            );
            error!("🔍 Verify the operator ServiceAccount, ClusterRole and ClusterRoleBinding still exist");
            error!(
                "   kubectl auth can-i list wavefronts.wavefront.com --as=system:serviceaccount:<namespace>:wavefront-controller-manager"
            );
            warn!(
                "⏳ Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                watch_restart_delay_secs
            );
            tokio::time::sleep(Duration::from_secs(watch_restart_delay_secs)).await;
            None
        }
        WatchErrorKind::Expired => {
            warn!(
                "Watch resource version expired (410) - this is normal during pod restarts, watch will restart"
            );
            warn!(error_type = "410", "watch.error.resource_version_expired");
            None
        }
        WatchErrorKind::Throttled => {
            let current_backoff = backoff.load(Ordering::Relaxed);
            warn!(
                "API server storage reinitializing (429), backing off for {}ms before restart...",
                current_backoff
            );
            tokio::time::sleep(Duration::from_millis(current_backoff)).await;
            let new_backoff = std::cmp::min(current_backoff.saturating_mul(2), max_backoff_ms);
            backoff.store(new_backoff, Ordering::Relaxed);
            None
        }
        WatchErrorKind::NotFound => {
            let resource_info = if error_string.contains("ResourceOverrideSet") {
                "ResourceOverrideSet resource"
            } else if error_string.contains("Wavefront") {
                "Wavefront resource"
            } else {
                "Resource"
            };
            warn!(
                "{} not found (404) - this may be normal if the resource was deleted or the CRD is missing. Error: {}",
                resource_info, error_string
            );
            Some(())
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(Duration::from_secs(watch_restart_delay_secs)).await;
            None
        }
    }
}
