//! Named property surface over the reconciler.
//!
//! Desired-property documents arrive as flat JSON objects. `connected` and
//! `logLevel` are settings of the supervisor itself; every other name is an
//! endpoint key. Names starting with `$` are transport metadata (such as
//! `$version`) and are skipped when applying a patch.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::convergence::{ApplyReport, EndpointReconciler};
use crate::desired::WriteOutcome;
use crate::error::{value_kind, SettingsError};
use crate::logging::LogLevelProperty;
use crate::types::level::LogLevel;

pub const CONNECTED: &str = "connected";
pub const LOG_LEVEL: &str = LogLevelProperty::NAME;

/// What a single property write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyWrite {
    Connected(bool),
    LogLevel(LogLevel),
    Endpoint(WriteOutcome),
}

/// A property whose setter returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedProperty {
    pub name: String,
    pub error: String,
}

/// Outcome of applying a desired-property patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub rejected: Vec<RejectedProperty>,
    /// Endpoint writes dropped by validation.
    pub ignored: Vec<String>,
    pub pass: ApplyReport,
}

impl EndpointReconciler {
    /// Write one named property.
    pub fn set_property(
        &mut self,
        name: &str,
        value: &Value,
    ) -> Result<PropertyWrite, SettingsError> {
        if name.eq_ignore_ascii_case(CONNECTED) {
            return match value {
                Value::Bool(b) => {
                    self.set_connected(*b);
                    Ok(PropertyWrite::Connected(*b))
                }
                other => Err(SettingsError::UnsupportedType {
                    property: CONNECTED.to_string(),
                    kind: value_kind(other),
                }),
            };
        }
        if name.eq_ignore_ascii_case(LOG_LEVEL) {
            return self.log_level().set(value).map(PropertyWrite::LogLevel);
        }
        Ok(PropertyWrite::Endpoint(self.write_endpoint(name, value)))
    }

    /// Read one named property. Endpoint keys read their pending payload,
    /// or `null`.
    pub fn get_property(&self, name: &str) -> Value {
        if name.eq_ignore_ascii_case(CONNECTED) {
            Value::Bool(self.connected())
        } else if name.eq_ignore_ascii_case(LOG_LEVEL) {
            self.log_level().get()
        } else {
            self.store().read(name)
        }
    }

    /// The properties reported back to the driver after a patch.
    pub fn reported_properties(&self) -> Map<String, Value> {
        let mut reported = Map::new();
        reported.insert(CONNECTED.to_string(), self.get_property(CONNECTED));
        reported.insert(LOG_LEVEL.to_string(), self.get_property(LOG_LEVEL));
        reported
    }

    /// Write every property of `patch`, then run one reconciliation pass.
    ///
    /// Setter errors are collected rather than aborting the patch, so one bad
    /// setting cannot hold back endpoint changes delivered alongside it.
    pub async fn apply_patch(&mut self, patch: &Map<String, Value>) -> PatchReport {
        let mut report = PatchReport::default();

        for (name, value) in patch {
            if name.starts_with('$') {
                continue;
            }
            match self.set_property(name, value) {
                Ok(PropertyWrite::Endpoint(outcome)) if outcome.is_ignored() => {
                    report.ignored.push(name.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(property = %name, error = %e, "rejected desired property");
                    report.rejected.push(RejectedProperty {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.pass = self.apply().await;
        report
    }
}
