//! # Wavefront Operator
//!
//! Installs, configures and self-heals the Wavefront observability stack from a
//! single `Wavefront` custom resource.
//!
//! ## Configuration
//!
//! Environment variables (see `OperatorConfig`):
//! - `POD_NAMESPACE`: namespace the operator and its components run in
//! - `OPERATOR_DEPLOYMENT_NAME`: the operator's own Deployment, owner of everything it creates
//! - `TEMPLATE_DIR`: root of the component template tree
//! - `RECONCILE_INTERVAL_SECS`: periodic requeue interval
//! - `RUST_LOG` / `LOG_LEVEL` / `LOG_FORMAT`: logging

use anyhow::Result;
use std::sync::Arc;
use wavefront_operator::config::OperatorConfig;
use wavefront_operator::runtime::deletion_watch::start_deletion_watch;
use wavefront_operator::runtime::initialization::initialize;
use wavefront_operator::runtime::watch_loop::run_watch_loop;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize(OperatorConfig::from_env()).await?;

    start_deletion_watch(init.wavefronts.clone(), Arc::clone(&init.reconciler));

    run_watch_loop(
        init.wavefronts,
        init.overrides,
        init.reconciler,
        init.server_state,
    )
    .await
}
