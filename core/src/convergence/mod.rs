//! Convergence engine: turns pending desired state into backend calls.
//!
//! The `reconciler` module owns the desired-state store and runs
//! reconciliation passes; `report` describes what a pass did.

pub mod reconciler;
pub mod report;

pub use reconciler::EndpointReconciler;
pub use report::{ApplyReport, EndpointAction, EndpointFailure};
