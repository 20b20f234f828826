use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level supervisor configuration, loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Initial minimum log level. Parsed like the `logLevel` property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// How endpoints are started. Required by the process backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationConfig>,
}

/// Command line used to run one worker process per active endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationConfig {
    pub program: String,
    /// Arguments; `{endpoint}` is replaced with the endpoint key.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variable receiving the credential payload.
    #[serde(default = "default_payload_env")]
    pub payload_env: String,
    /// Environment variable receiving the endpoint key.
    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,
    /// How long to wait after SIGTERM before SIGKILL.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

impl ActivationConfig {
    pub fn new(program: &str, args: &[&str]) -> Self {
        ActivationConfig {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            payload_env: default_payload_env(),
            endpoint_env: default_endpoint_env(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }

    /// Arguments for a given endpoint, with `{endpoint}` substituted.
    pub fn args_for(&self, key: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{endpoint}", key))
            .collect()
    }
}

fn default_payload_env() -> String {
    "ENDPOINT_CREDENTIALS".into()
}

fn default_endpoint_env() -> String {
    "ENDPOINT_ID".into()
}

fn default_stop_grace_ms() -> u64 {
    500
}

/// Load a supervisor config from a YAML file.
pub fn load(path: &Path) -> Result<SupervisorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse a supervisor config from a YAML string.
pub fn parse(content: &str) -> Result<SupervisorConfig, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}
