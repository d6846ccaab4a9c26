//! # Controller
//!
//! Core controller modules for the Wavefront operator.
//!
//! - `backoff`: Exponential backoff for failed passes
//! - `types`: Reconciler context, errors and pass outcome
//! - `reconcile`: One reconciliation pass
//! - `apply`: Create/patch/delete of synthesized objects
//! - `status`: Status values and best-effort status writes

pub mod apply;
pub mod backoff;
pub mod reconcile;
pub mod status;
pub mod types;

pub use reconcile::{override_set_key, reconcile, synthesize, wavefront_key};
pub use types::{BackoffState, PassOutcome, Reconciler, ReconcilerError};
