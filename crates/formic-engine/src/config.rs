//! Run configuration. Loaded from `./formic.yaml`, then
//! `~/.formic/config.yaml`, then defaults; CLI flags override on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audit::DEFAULT_RETENTION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// DevTools endpoint of the operator's already-running browser.
    pub cdp_url: String,
    pub logs_dir: PathBuf,
    /// How many past session records to keep on disk.
    pub retention: usize,
    /// Courtesy pause between consecutive jobs.
    pub job_delay_secs: u64,
    /// Longer pause when the next job is at a different company.
    pub company_delay_secs: u64,
    /// Submit without a human decision when the high-risk guard passes.
    pub auto_proceed: bool,
    /// Present the summary and wait for the operator to submit in the
    /// browser instead of prompting in the terminal.
    pub watch_browser: bool,
    /// Prompt-mode confirmation timeout in seconds; 0 blocks forever.
    pub confirm_timeout_secs: u64,
    /// Model used by the inference tier when credentials are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_model: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cdp_url: "http://localhost:9222".to_string(),
            logs_dir: PathBuf::from("logs"),
            retention: DEFAULT_RETENTION,
            job_delay_secs: 3,
            company_delay_secs: 15,
            auto_proceed: false,
            watch_browser: false,
            confirm_timeout_secs: 0,
            inference_model: None,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./formic.yaml
    /// 2. ~/.formic/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<RunConfig, ConfigError> {
        let local_config = PathBuf::from("./formic.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".formic").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(RunConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<RunConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: RunConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let config = RunConfig::default();
        assert!(!config.auto_proceed);
        assert_eq!(config.retention, 10);
        assert_eq!(config.cdp_url, "http://localhost:9222");
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let config: RunConfig =
            serde_yaml::from_str("auto_proceed: true\njob_delay_secs: 7\n").unwrap();
        assert!(config.auto_proceed);
        assert_eq!(config.job_delay_secs, 7);
        assert_eq!(config.retention, 10);
    }
}
