//! Reconciler: applies pending desired state through an activation backend.

use std::sync::Arc;

use serde_json::Value;

use super::report::{ApplyReport, EndpointAction};
use crate::activation::EndpointActivator;
use crate::desired::{DesiredStateStore, WriteOutcome};
use crate::logging::{LogLevelControl, LogLevelProperty};

/// Owns the pending desired state and turns it into backend calls.
///
/// Holds no memory of what is currently running: every pass acts only on
/// what was written since the previous one, and relies on the backend being
/// idempotent. All mutators take `&mut self`, so at most one pass runs at a
/// time per reconciler.
pub struct EndpointReconciler {
    store: DesiredStateStore,
    activator: Arc<dyn EndpointActivator>,
    log_level: LogLevelProperty,
    connected: bool,
}

impl EndpointReconciler {
    pub fn new(activator: Arc<dyn EndpointActivator>, log_level: Arc<dyn LogLevelControl>) -> Self {
        EndpointReconciler {
            store: DesiredStateStore::new(),
            activator,
            log_level: LogLevelProperty::new(log_level),
            connected: false,
        }
    }

    /// Replace the (empty) store, e.g. to use a custom payload validator.
    pub fn with_store(mut self, store: DesiredStateStore) -> Self {
        self.store = store;
        self
    }

    /// Connection flag reported by the driver. Not used for reconciliation.
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn log_level(&self) -> &LogLevelProperty {
        &self.log_level
    }

    pub fn store(&self) -> &DesiredStateStore {
        &self.store
    }

    pub fn set_endpoint(&mut self, key: &str, payload: &str) -> WriteOutcome {
        self.store.set_endpoint(key, payload)
    }

    pub fn remove_endpoint(&mut self, key: &str) -> WriteOutcome {
        self.store.remove_endpoint(key)
    }

    pub fn write_endpoint(&mut self, key: &str, value: &Value) -> WriteOutcome {
        self.store.write(key, value)
    }

    pub fn pending_payload(&self, key: &str) -> Option<&str> {
        self.store.pending_payload(key)
    }

    /// Run one reconciliation pass.
    ///
    /// Entries are handled in insertion order, one backend call at a time.
    /// Backend failures are logged and recorded in the report; they never
    /// stop the pass. The store is empty when this returns.
    pub async fn apply(&mut self) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (key, desired) in self.store.snapshot() {
            match desired.activation() {
                None => self.deactivate(&key, &mut report).await,
                Some(payload) => {
                    if !self.activate(&key, payload, &mut report).await {
                        self.store.discard(&key);
                    }
                }
            }
        }

        self.store.clear();

        tracing::info!(
            attempted = report.attempted(),
            activated = report.activated.len(),
            deactivated = report.deactivated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "reconciliation pass complete"
        );
        report
    }

    async fn deactivate(&self, key: &str, report: &mut ApplyReport) {
        match self.activator.deactivate(key).await {
            Ok(()) => report.deactivated.push(key.to_string()),
            Err(e) => {
                tracing::error!(endpoint = %key, error = %e, "error stopping endpoint");
                report.fail(key, EndpointAction::Deactivate, e.to_string());
            }
        }
    }

    /// Returns true only if the backend accepted the activation.
    async fn activate(&self, key: &str, payload: &str, report: &mut ApplyReport) -> bool {
        if !self.store.is_valid(payload) {
            tracing::warn!(endpoint = %key, "skipping endpoint with malformed payload");
            report.skipped.push(key.to_string());
            return false;
        }
        match self.activator.activate(key, payload).await {
            Ok(()) => {
                report.activated.push(key.to_string());
                true
            }
            Err(e) => {
                tracing::error!(endpoint = %key, error = %e, "error starting endpoint");
                report.fail(key, EndpointAction::Activate, e.to_string());
                false
            }
        }
    }
}

impl std::fmt::Debug for EndpointReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointReconciler")
            .field("store", &self.store)
            .field("log_level", &self.log_level)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
