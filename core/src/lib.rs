//! Endpoint supervisor core.
//!
//! A desired-state reconciler for named endpoints. A driver writes desired
//! properties (an activation payload per endpoint, plus supervisor settings),
//! then calls [`EndpointReconciler::apply`], which starts and stops endpoints
//! through an [`EndpointActivator`] backend, one at a time and in write
//! order, isolating failures per endpoint.

pub mod activation;
pub mod convergence;
pub mod desired;
pub mod error;
pub mod logging;
pub mod properties;
pub mod types;

pub use activation::{EndpointActivator, ProcessActivator, RecordingActivator};
pub use convergence::{ApplyReport, EndpointReconciler};
pub use desired::{DesiredPayload, DesiredStateStore, WriteOutcome};
pub use error::{ActivationError, ConfigError, LoggingError, SettingsError};
pub use logging::{LogLevelControl, ReloadLevel, SharedLevel};
pub use properties::PatchReport;
pub use types::{ActivationConfig, LogLevel, SupervisorConfig};
