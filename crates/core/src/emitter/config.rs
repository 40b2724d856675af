//! Emitter configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the next-episode emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Enable/disable emission. When disabled, runs produce no requests.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmitterConfig::default();
        assert!(config.enabled);
    }

    #[test]
    fn test_deserialize_disabled() {
        let config: EmitterConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn test_deserialize_empty() {
        let config: EmitterConfig = toml::from_str("").unwrap();
        assert!(config.enabled);
    }
}
