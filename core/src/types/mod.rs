//! Plain data types: configuration and log levels.

pub mod config;
pub mod level;

pub use config::{ActivationConfig, SupervisorConfig};
pub use level::LogLevel;
