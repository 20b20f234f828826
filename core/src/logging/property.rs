use std::sync::Arc;

use serde_json::Value;

use super::LogLevelControl;
use crate::error::{value_kind, SettingsError};
use crate::types::level::LogLevel;

/// The `logLevel` property: JSON in, JSON out, over a level handle.
#[derive(Clone)]
pub struct LogLevelProperty {
    control: Arc<dyn LogLevelControl>,
}

impl LogLevelProperty {
    pub const NAME: &'static str = "logLevel";

    pub fn new(control: Arc<dyn LogLevelControl>) -> Self {
        LogLevelProperty { control }
    }

    /// Apply a property value.
    ///
    /// `null` resets to `Information`; a string must name a level; any other
    /// type is rejected. A level the handle cannot put into effect is
    /// reported as `NotApplied`. On error the current level is left
    /// unchanged.
    pub fn set(&self, value: &Value) -> Result<LogLevel, SettingsError> {
        let level = match value {
            Value::Null => LogLevel::default(),
            Value::String(s) => s.parse()?,
            other => {
                return Err(SettingsError::UnsupportedType {
                    property: Self::NAME.to_string(),
                    kind: value_kind(other),
                })
            }
        };
        self.control.set_level(level)?;
        Ok(level)
    }

    /// The current level as its canonical name.
    pub fn get(&self) -> Value {
        Value::String(self.control.level().as_str().to_string())
    }

    pub fn level(&self) -> LogLevel {
        self.control.level()
    }
}

impl std::fmt::Debug for LogLevelProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLevelProperty")
            .field("level", &self.control.level())
            .finish()
    }
}
