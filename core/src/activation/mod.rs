//! Activation backends for endpoints.
//!
//! Provides the `EndpointActivator` trait and implementations that run one
//! worker process per endpoint (production) or record calls (testing and
//! dry runs).

pub mod mock;
pub mod process;

use async_trait::async_trait;

use crate::error::ActivationError;

pub use mock::{ActivationCall, RecordingActivator};
pub use process::ProcessActivator;

/// Starts and stops endpoints. Implementations should be idempotent:
/// activating a running endpoint with the same payload, or deactivating a
/// stopped one, succeeds without side effects.
#[async_trait]
pub trait EndpointActivator: Send + Sync {
    /// Start the endpoint `key` with its credential payload.
    async fn activate(&self, key: &str, payload: &str) -> Result<(), ActivationError>;

    /// Stop the endpoint `key`.
    async fn deactivate(&self, key: &str) -> Result<(), ActivationError>;
}
