use std::fmt;
use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;

use crate::error::SettingsError;

/// Minimum severity for log output.
///
/// Ordinals and names follow the usual six-level scheme, so `"3"` and
/// `"warning"` both parse to `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Verbose,
    Debug,
    #[default]
    Information,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Information,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Canonical name, as reported back to the driver.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Verbose => "Verbose",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Fatal => "Fatal",
        }
    }

    /// Case-insensitive parse accepting canonical names, common aliases
    /// and ordinals.
    pub fn parse(s: &str) -> Option<LogLevel> {
        let s = s.trim();
        if let Ok(ordinal) = s.parse::<usize>() {
            return LogLevel::ALL.get(ordinal).copied();
        }
        match s.to_ascii_lowercase().as_str() {
            "verbose" | "trace" => Some(LogLevel::Verbose),
            "debug" => Some(LogLevel::Debug),
            "information" | "info" => Some(LogLevel::Information),
            "warning" | "warn" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            "fatal" | "critical" => Some(LogLevel::Fatal),
            _ => None,
        }
    }

    /// The `tracing` filter admitting this level and above. `tracing` has
    /// no fatal level, so `Fatal` shares `ERROR` with `Error`.
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Verbose => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Information => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::parse(s).ok_or_else(|| SettingsError::InvalidArgument(s.to_string()))
    }
}
