//! Error types shared across the supervisor core.

use std::path::PathBuf;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Settings errors
// ---------------------------------------------------------------------------

/// Errors surfaced to the caller of a property setter.
///
/// Endpoint writes never produce these; malformed endpoint payloads are
/// reported through `WriteOutcome::Ignored` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A string value that does not name a known setting value.
    #[error("bad log level value '{0}' passed")]
    InvalidArgument(String),
    /// A value of the wrong JSON type for the property.
    #[error("bad value type {kind} for property '{property}'")]
    UnsupportedType {
        property: String,
        kind: &'static str,
    },
    /// The value was valid but could not be put into effect.
    #[error("cannot apply setting: {0}")]
    NotApplied(String),
}

impl From<LoggingError> for SettingsError {
    fn from(e: LoggingError) -> Self {
        SettingsError::NotApplied(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Activation errors
// ---------------------------------------------------------------------------

/// Failure reported by an activation backend.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("failed to start endpoint '{key}': {source}")]
    Spawn {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to stop endpoint '{key}': {source}")]
    Stop {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// The backend refused the request.
    #[error("endpoint '{key}' rejected: {reason}")]
    Rejected { key: String, reason: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid supervisor config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("no activation section in supervisor config")]
    MissingActivation,
}

// ---------------------------------------------------------------------------
// Logging errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot install log subscriber: {0}")]
    Init(String),
    #[error("cannot change log level: {0}")]
    Reload(String),
}

/// Name of a JSON value's type, as used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_kind_names() {
        assert_eq!(value_kind(&Value::Null), "null");
        assert_eq!(value_kind(&json!(true)), "boolean");
        assert_eq!(value_kind(&json!(3)), "number");
        assert_eq!(value_kind(&json!("x")), "string");
        assert_eq!(value_kind(&json!([1])), "array");
        assert_eq!(value_kind(&json!({"a": 1})), "object");
    }

    #[test]
    fn invalid_argument_carries_value() {
        let err = SettingsError::InvalidArgument("loud".into());
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn unsupported_type_names_property_and_kind() {
        let err = SettingsError::UnsupportedType {
            property: "logLevel".into(),
            kind: "number",
        };
        let msg = err.to_string();
        assert!(msg.contains("logLevel"));
        assert!(msg.contains("number"));
    }

    #[test]
    fn logging_error_becomes_not_applied() {
        let err = SettingsError::from(LoggingError::Reload("gone".into()));
        assert!(err.to_string().contains("gone"));
        assert!(matches!(err, SettingsError::NotApplied(_)));
    }

    #[test]
    fn activation_error_display() {
        let err = ActivationError::Rejected {
            key: "ep1".into(),
            reason: "quota".into(),
        };
        assert_eq!(err.to_string(), "endpoint 'ep1' rejected: quota");
    }
}
