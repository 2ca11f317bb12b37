//! Auto-save and server configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Debounced auto-save settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Save automatically after edits; forced saves work either way
    pub enabled: bool,

    /// Quiet period after the last edit before a save starts
    #[serde(rename = "debounce-ms")]
    pub debounce_ms: u64,

    /// Command channel capacity of the auto-save actor
    #[serde(rename = "channel-buffer")]
    pub channel_buffer: usize,
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 2000,
            channel_buffer: 64,
        }
    }
}

/// Persistence server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the roadmap API
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User id sent with every save
    #[serde(rename = "user-id")]
    pub user_id: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user_id: "local".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let autosave = AutoSaveConfig::default();
        assert!(autosave.enabled);
        assert_eq!(autosave.debounce(), Duration::from_secs(2));

        let server = ServerConfig::default();
        assert_eq!(server.base_url, "http://localhost:8080");
        assert_eq!(server.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_yaml() {
        let autosave: AutoSaveConfig = serde_yaml::from_str("debounce-ms: 500").unwrap();
        assert!(autosave.enabled);
        assert_eq!(autosave.debounce_ms, 500);
        assert_eq!(autosave.channel_buffer, 64);
    }
}
