//! Recording activation backend.
//!
//! Records every call in order and fails on request, making it easy to write
//! deterministic tests for the reconciler. Also backs dry-run planning.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use super::EndpointActivator;
use crate::error::ActivationError;

/// One backend call as seen by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ActivationCall {
    Activate { key: String, payload: String },
    Deactivate { key: String },
}

impl ActivationCall {
    pub fn key(&self) -> &str {
        match self {
            ActivationCall::Activate { key, .. } | ActivationCall::Deactivate { key } => key,
        }
    }
}

/// A test double that records calls and fails for configured keys.
#[derive(Debug, Default)]
pub struct RecordingActivator {
    calls: Mutex<Vec<ActivationCall>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingActivator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder whose calls for `keys` fail.
    pub fn failing_on(keys: &[&str]) -> Self {
        let activator = Self::new();
        for key in keys {
            activator.fail_on(key);
        }
        activator
    }

    /// Make every subsequent call for `key` fail.
    pub fn fail_on(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }

    /// All calls received so far, in order. Failed calls are included.
    pub fn calls(&self) -> Vec<ActivationCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: ActivationCall) -> Result<(), ActivationError> {
        let key = call.key().to_string();
        self.calls.lock().push(call);
        if self.failing.lock().contains(&key) {
            return Err(ActivationError::Rejected {
                key,
                reason: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EndpointActivator for RecordingActivator {
    async fn activate(&self, key: &str, payload: &str) -> Result<(), ActivationError> {
        self.record(ActivationCall::Activate {
            key: key.to_string(),
            payload: payload.to_string(),
        })
    }

    async fn deactivate(&self, key: &str) -> Result<(), ActivationError> {
        self.record(ActivationCall::Deactivate {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let rec = RecordingActivator::new();
        rec.activate("ep1", "YQ==").await.unwrap();
        rec.deactivate("ep2").await.unwrap();
        assert_eq!(
            rec.calls(),
            vec![
                ActivationCall::Activate {
                    key: "ep1".into(),
                    payload: "YQ==".into(),
                },
                ActivationCall::Deactivate { key: "ep2".into() },
            ]
        );
    }

    #[tokio::test]
    async fn configured_keys_fail_but_are_recorded() {
        let rec = RecordingActivator::failing_on(&["bad"]);
        assert!(rec.activate("bad", "YQ==").await.is_err());
        assert!(rec.deactivate("bad").await.is_err());
        assert!(rec.activate("good", "YQ==").await.is_ok());
        assert_eq!(rec.calls().len(), 3);
    }

    #[test]
    fn call_serializes_with_tag() {
        let call = ActivationCall::Deactivate { key: "ep1".into() };
        let json = serde_json::to_value(&call).unwrap();
        let expected = serde_json::json!({"call": "deactivate", "key": "ep1"});
        assert_eq!(json, expected);
    }
}
