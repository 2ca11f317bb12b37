//! Roadplan configuration types and loading

use eyre::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::persist::{AutoSaveConfig, ServerConfig};
use crate::scheduler::PlanningConfig;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Grid size and auto-plan policy
    pub planning: PlanningConfig,

    /// Debounced auto-save
    pub autosave: AutoSaveConfig,

    /// Persistence server
    pub server: ServerConfig,
}

/// Project-local config file, looked up in the working directory
const LOCAL_CONFIG: &str = ".roadplan.yml";

/// Longest grid the planner accepts (ten years of weeks)
pub const MAX_WEEK_COUNT: usize = 520;

impl Config {
    /// Config files to try, most specific first
    ///
    /// An explicit path replaces the search entirely.
    fn search_paths(config_path: Option<&PathBuf>) -> Vec<PathBuf> {
        match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("roadplan").join("roadplan.yml"));
                }
                paths
            }
        }
    }

    /// Load configuration: explicit path, then `.roadplan.yml`, then the
    /// user config dir, then defaults
    ///
    /// An explicit path must load. Broken files found by the search are
    /// skipped with a warning.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for path in Self::search_paths(None).iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return Ok(config),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unusable config file"),
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::search_paths(config_path)
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|c| c.log_level)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context(format!("Invalid config in {}", path.display()))?;

        info!(
            path = %path.display(),
            week_count = config.planning.week_count,
            autosave = config.autosave.enabled,
            "Loaded config"
        );
        Ok(config)
    }

    /// Reject values the planner or the auto-saver cannot work with
    pub fn validate(&self) -> Result<()> {
        let planning = &self.planning;
        ensure!(
            (1..=MAX_WEEK_COUNT).contains(&planning.week_count),
            "planning.week-count must be between 1 and {}, got {}",
            MAX_WEEK_COUNT,
            planning.week_count
        );
        ensure!(
            planning.origin_week < planning.week_count,
            "planning.origin-week {} is outside the {}-week grid",
            planning.origin_week,
            planning.week_count
        );
        ensure!(self.autosave.channel_buffer > 0, "autosave.channel-buffer must be positive");
        if self.autosave.enabled && self.autosave.debounce_ms == 0 {
            warn!("autosave.debounce-ms is 0, every edit saves immediately");
        }

        let server = &self.server;
        ensure!(
            server.base_url.starts_with("http://") || server.base_url.starts_with("https://"),
            "server.base-url must be an http(s) URL, got '{}'",
            server.base_url
        );
        ensure!(!server.user_id.trim().is_empty(), "server.user-id must not be empty");
        ensure!(server.timeout_ms > 0, "server.timeout-ms must be positive");
        Ok(())
    }
}
