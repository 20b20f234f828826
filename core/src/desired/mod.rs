//! Desired-state store: pending per-endpoint writes awaiting reconciliation.

pub mod store;
pub mod validate;

pub use store::{DesiredPayload, DesiredStateStore, IgnoreReason, WriteOutcome};
pub use validate::{is_base64, PayloadValidator};
