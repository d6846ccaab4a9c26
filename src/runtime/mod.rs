//! # Runtime
//!
//! Process-level wiring around the reconciler.
//!
//! - `initialization`: Logging, metrics, probe server and client setup
//! - `watch_loop`: `kube-runtime` controller with automatic restart
//! - `deletion_watch`: Teardown when the `Wavefront` resource is deleted
//! - `error_policy`: Per-resource backoff and watch error classification

pub mod deletion_watch;
pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
