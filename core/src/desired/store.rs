//! Pending desired state, keyed by endpoint.
//!
//! Writes accumulate here between reconciliation passes so a burst of
//! property updates collapses into one pass. The map keeps insertion order;
//! overwriting a key keeps its original position.

use indexmap::IndexMap;
use serde_json::Value;

use super::validate::{is_base64, PayloadValidator};
use crate::error::value_kind;

/// What the driver wants for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredPayload {
    /// Start (or restart) the endpoint with this credential payload.
    Activate(String),
    /// Stop the endpoint. Produced by a null write.
    Deactivate,
}

impl DesiredPayload {
    /// The payload to activate with, if any. Empty payloads count as none.
    pub fn activation(&self) -> Option<&str> {
        match self {
            DesiredPayload::Activate(p) if !p.is_empty() => Some(p),
            _ => None,
        }
    }
}

/// Why a write was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotBase64,
    UnsupportedType(&'static str),
}

/// Result of a keyed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Payload stored (inserted or overwritten).
    Stored,
    /// Endpoint marked for deactivation.
    Deactivation,
    /// Write dropped; the store is unchanged.
    Ignored(IgnoreReason),
}

impl WriteOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, WriteOutcome::Ignored(_))
    }
}

/// Insertion-ordered map of endpoint key to pending desired payload.
#[derive(Debug, Clone)]
pub struct DesiredStateStore {
    entries: IndexMap<String, DesiredPayload>,
    validator: PayloadValidator,
}

impl DesiredStateStore {
    /// Create an empty store validating payloads as base64.
    pub fn new() -> Self {
        Self::with_validator(is_base64)
    }

    pub fn with_validator(validator: PayloadValidator) -> Self {
        DesiredStateStore {
            entries: IndexMap::new(),
            validator,
        }
    }

    /// Whether `payload` passes this store's encoding check.
    pub fn is_valid(&self, payload: &str) -> bool {
        (self.validator)(payload)
    }

    /// Record an activation payload for `key`.
    ///
    /// A payload failing validation is dropped without touching any
    /// existing entry.
    pub fn set_endpoint(&mut self, key: &str, payload: &str) -> WriteOutcome {
        if !self.is_valid(payload) {
            return WriteOutcome::Ignored(IgnoreReason::NotBase64);
        }
        let desired = DesiredPayload::Activate(payload.to_string());
        self.entries.insert(key.to_string(), desired);
        WriteOutcome::Stored
    }

    /// Mark `key` for deactivation on the next pass.
    pub fn remove_endpoint(&mut self, key: &str) -> WriteOutcome {
        let key = key.to_string();
        self.entries.insert(key, DesiredPayload::Deactivate);
        WriteOutcome::Deactivation
    }

    /// Keyed write of a raw JSON property value.
    ///
    /// - `null` marks the endpoint for deactivation.
    /// - a string is stored if it is valid base64.
    /// - anything else is ignored.
    pub fn write(&mut self, key: &str, value: &Value) -> WriteOutcome {
        match value {
            Value::Null => self.remove_endpoint(key),
            Value::String(s) => self.set_endpoint(key, s),
            other => WriteOutcome::Ignored(IgnoreReason::UnsupportedType(value_kind(other))),
        }
    }

    /// The pending activation payload for `key`. `None` if the key has no
    /// pending entry or is marked for deactivation.
    pub fn pending_payload(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(DesiredPayload::Activate(p)) => Some(p),
            _ => None,
        }
    }

    /// The pending entry for `key`, including deactivation markers.
    pub fn pending(&self, key: &str) -> Option<&DesiredPayload> {
        self.entries.get(key)
    }

    /// JSON view of `pending_payload`: a string, or `null`.
    pub fn read(&self, key: &str) -> Value {
        self.pending_payload(key)
            .map(|p| Value::String(p.to_string()))
            .unwrap_or(Value::Null)
    }

    /// Drop the pending entry for `key` without acting on it.
    pub fn discard(&mut self, key: &str) -> Option<DesiredPayload> {
        self.entries.shift_remove(key)
    }

    /// Owned copy of all entries, in insertion order.
    pub fn snapshot(&self) -> Vec<(String, DesiredPayload)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert without validation, for exercising the defensive re-check.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, key: &str, payload: DesiredPayload) {
        self.entries.insert(key.to_string(), payload);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DesiredStateStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const A: &str = "aGVsbG8=";
    const B: &str = "d29ybGQ=";

    #[test]
    fn set_and_read() {
        let mut store = DesiredStateStore::new();
        assert_eq!(store.set_endpoint("ep1", A), WriteOutcome::Stored);
        assert_eq!(store.pending_payload("ep1"), Some(A));
        assert_eq!(store.read("ep1"), json!(A));
    }

    #[test]
    fn absent_key_reads_null() {
        let store = DesiredStateStore::new();
        assert_eq!(store.pending_payload("nope"), None);
        assert_eq!(store.read("nope"), Value::Null);
    }

    #[test]
    fn overwrite_keeps_latest_value() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        store.set_endpoint("ep1", B);
        assert_eq!(store.pending_payload("ep1"), Some(B));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn overwrite_keeps_insertion_position() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        store.set_endpoint("ep2", A);
        store.set_endpoint("ep1", B);
        let keys: Vec<&str> = store.keys().collect();
        assert_eq!(keys, vec!["ep1", "ep2"]);
    }

    #[test]
    fn malformed_payload_leaves_absent_key_absent() {
        let mut store = DesiredStateStore::new();
        let outcome = store.set_endpoint("ep1", "not-base64!");
        assert_eq!(outcome, WriteOutcome::Ignored(IgnoreReason::NotBase64));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_payload_does_not_overwrite() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        assert!(store.set_endpoint("ep1", "???").is_ignored());
        assert_eq!(store.pending_payload("ep1"), Some(A));
    }

    #[test]
    fn null_write_marks_deactivation_and_reads_null() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        assert_eq!(store.write("ep1", &Value::Null), WriteOutcome::Deactivation);
        assert_eq!(store.read("ep1"), Value::Null);
        assert_eq!(store.pending("ep1"), Some(&DesiredPayload::Deactivate));
    }

    #[test]
    fn null_write_for_unknown_key_records_marker() {
        let mut store = DesiredStateStore::new();
        store.remove_endpoint("ep9");
        assert_eq!(store.len(), 1);
        assert_eq!(store.read("ep9"), Value::Null);
    }

    #[test]
    fn write_rejects_non_string_types() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        assert_eq!(
            store.write("ep1", &json!(42)),
            WriteOutcome::Ignored(IgnoreReason::UnsupportedType("number"))
        );
        assert_eq!(
            store.write("ep2", &json!({"a": 1})),
            WriteOutcome::Ignored(IgnoreReason::UnsupportedType("object"))
        );
        assert_eq!(store.pending_payload("ep1"), Some(A));
        assert!(store.pending("ep2").is_none());
    }

    #[test]
    fn write_string_goes_through_validation() {
        let mut store = DesiredStateStore::new();
        assert_eq!(store.write("ep1", &json!(A)), WriteOutcome::Stored);
        assert!(store.write("ep2", &json!("nope!")).is_ignored());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_payload_is_stored_but_not_an_activation() {
        let mut store = DesiredStateStore::new();
        assert_eq!(store.set_endpoint("ep1", ""), WriteOutcome::Stored);
        assert_eq!(store.pending("ep1").unwrap().activation(), None);
    }

    #[test]
    fn discard_and_clear() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        store.set_endpoint("ep2", B);
        assert_eq!(
            store.discard("ep1"),
            Some(DesiredPayload::Activate(A.to_string()))
        );
        assert_eq!(store.discard("ep1"), None);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_is_detached() {
        let mut store = DesiredStateStore::new();
        store.set_endpoint("ep1", A);
        let snap = store.snapshot();
        store.clear();
        assert_eq!(
            snap,
            vec![("ep1".to_string(), DesiredPayload::Activate(A.into()))]
        );
    }

    #[test]
    fn custom_validator() {
        fn anything(_: &str) -> bool {
            true
        }
        let mut store = DesiredStateStore::with_validator(anything);
        let outcome = store.set_endpoint("ep1", "not-base64!");
        assert_eq!(outcome, WriteOutcome::Stored);
    }
}
