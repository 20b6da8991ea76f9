//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Knobs of a [`Runtime`](crate::Runtime). Every field has a default, so a
/// partial JSON document is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Run the optimizer on every definition before committing it.
    pub optimize: bool,

    /// Upper bound on optimizer passes per definition.
    pub max_optimizer_passes: usize,

    /// Forward engine events to `tracing` when no other sink is installed.
    pub log_trace: bool,

    /// Parent levels rendered by [`Runtime::describe`](crate::Runtime::describe).
    pub describe_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            max_optimizer_passes: 16,
            log_trace: false,
            describe_depth: 2,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RuntimeConfig::from_json(r#"{"optimize": false}"#).unwrap();
        assert!(!config.optimize);
        assert_eq!(config.max_optimizer_passes, 16);
        assert_eq!(config.describe_depth, 2);
        assert_eq!(RuntimeConfig::from_json("{}").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(RuntimeConfig::from_json(r#"{"optimize": "yes"}"#).is_err());
    }
}
