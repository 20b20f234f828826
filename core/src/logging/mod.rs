//! Log-level control.
//!
//! The minimum log level is reached through a `LogLevelControl` handle rather
//! than a process global, so each reconciler (and each test) can hold its
//! own. `ReloadLevel` is the production handle: it drives the level filter
//! of the installed `tracing` subscriber, so changes take effect immediately
//! for every subsequent event in the process.

pub mod property;

use parking_lot::RwLock;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, Registry};

use crate::error::LoggingError;
use crate::types::level::LogLevel;

pub use property::LogLevelProperty;

/// Read/write access to a minimum log level.
pub trait LogLevelControl: Send + Sync {
    fn level(&self) -> LogLevel;
    /// Change the level. On error the previous level stays in effect.
    fn set_level(&self, level: LogLevel) -> Result<(), LoggingError>;
}

/// In-memory level with no effect on log output.
#[derive(Debug, Default)]
pub struct SharedLevel {
    level: RwLock<LogLevel>,
}

impl SharedLevel {
    pub fn new(level: LogLevel) -> Self {
        SharedLevel {
            level: RwLock::new(level),
        }
    }
}

impl LogLevelControl for SharedLevel {
    fn level(&self) -> LogLevel {
        *self.level.read()
    }

    fn set_level(&self, level: LogLevel) -> Result<(), LoggingError> {
        *self.level.write() = level;
        Ok(())
    }
}

/// Level bound to the reloadable filter of the global subscriber.
pub struct ReloadLevel {
    handle: reload::Handle<LevelFilter, Registry>,
    level: RwLock<LogLevel>,
}

impl LogLevelControl for ReloadLevel {
    fn level(&self) -> LogLevel {
        *self.level.read()
    }

    fn set_level(&self, level: LogLevel) -> Result<(), LoggingError> {
        self.handle
            .reload(level.to_filter())
            .map_err(|e| LoggingError::Reload(e.to_string()))?;
        *self.level.write() = level;
        Ok(())
    }
}

/// Install the global subscriber: a reloadable level filter in front of an
/// stderr formatter. Fails if a global subscriber is already set.
pub fn init(level: LogLevel) -> Result<ReloadLevel, LoggingError> {
    let (filter, handle) = reload::Layer::new(level.to_filter());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;
    Ok(ReloadLevel {
        handle,
        level: RwLock::new(level),
    })
}
