use serde::Serialize;

/// Which backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointAction {
    Activate,
    Deactivate,
}

/// A backend call that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointFailure {
    pub key: String,
    pub action: EndpointAction,
    pub error: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub activated: Vec<String>,
    pub deactivated: Vec<String>,
    /// Entries whose payload failed validation; no backend call was made.
    pub skipped: Vec<String>,
    pub failed: Vec<EndpointFailure>,
}

impl ApplyReport {
    /// Number of backend calls issued, successful or not.
    pub fn attempted(&self) -> usize {
        self.activated.len() + self.deactivated.len() + self.failed.len()
    }

    /// True if no call failed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub(crate) fn fail(&mut self, key: &str, action: EndpointAction, error: String) {
        self.failed.push(EndpointFailure {
            key: key.to_string(),
            action,
            error,
        });
    }
}
