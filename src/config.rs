//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.portfoliox.toml` files.

use crate::analysis::RecencyThresholds;
use crate::api::ApiSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".portfoliox.toml";

/// Upper bound for the recency thresholds (about a century).
pub const MAX_THRESHOLD_DAYS: i64 = 36_500;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Dashboard aggregation settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the PortfolioX backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Dashboard aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Entries in the recent activity feed.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Days since the last update that still count as fresh.
    #[serde(default = "default_fresh_days")]
    pub fresh_days: i64,

    /// Days since the last update that still count as aging.
    #[serde(default = "default_aging_days")]
    pub aging_days: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            fresh_days: default_fresh_days(),
            aging_days: default_aging_days(),
        }
    }
}

fn default_recent_limit() -> usize {
    5
}

fn default_fresh_days() -> i64 {
    7
}

fn default_aging_days() -> i64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Show a progress bar while fetching per-student data.
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Width of text bar charts, in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            chart_width: default_chart_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chart_width() -> usize {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.portfoliox.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject settings the dashboards cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            bail!("api.base_url must start with 'http://' or 'https://'");
        }
        if self.api.timeout_seconds == 0 {
            bail!("api.timeout_seconds must be at least 1");
        }
        if self.dashboard.recent_limit == 0 {
            bail!("dashboard.recent_limit must be at least 1");
        }
        if self.dashboard.fresh_days < 0 || self.dashboard.aging_days < self.dashboard.fresh_days
        {
            bail!("dashboard.fresh_days must be >= 0 and <= dashboard.aging_days");
        }
        if self.dashboard.aging_days > MAX_THRESHOLD_DAYS {
            bail!(
                "dashboard.aging_days must be at most {} days",
                MAX_THRESHOLD_DAYS
            );
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(limit) = args.recent_limit {
            self.dashboard.recent_limit = limit;
        }
        if args.quiet || args.no_progress {
            self.report.show_progress = false;
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api.base_url.clone(),
            timeout_seconds: self.api.timeout_seconds,
        }
    }

    pub fn thresholds(&self) -> RecencyThresholds {
        RecencyThresholds {
            fresh_days: self.dashboard.fresh_days,
            aging_days: self.dashboard.aging_days,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.dashboard.recent_limit, 5);
        assert_eq!(config.thresholds(), RecencyThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
base_url = "https://portfolio.example.edu"
timeout_seconds = 10

[dashboard]
recent_limit = 10
fresh_days = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://portfolio.example.edu");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.dashboard.recent_limit, 10);
        assert_eq!(config.dashboard.fresh_days, 3);
        assert_eq!(config.dashboard.aging_days, 30);
        assert!(config.report.show_progress);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[report]\nshow_progress = false\n",
        )
        .unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert!(!config.report.show_progress);
    }

    #[test]
    fn test_load_rejects_bad_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[dashboard]\nfresh_days = 40\naging_days = 30\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_out_of_range_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[dashboard]\nfresh_days = 200000000000000\naging_days = 200000000000000\n",
        )
        .unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::write(&path, "[dashboard]\nfresh_days = 7\naging_days = 36500\n").unwrap();
        assert!(Config::load(&path).is_ok());
    }

    #[test]
    fn test_load_rejects_zero_recent_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[dashboard]\nrecent_limit = 0\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[api]\nbase_url = \"localhost:8080\"\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.dashboard.aging_days, 30);
    }
}
