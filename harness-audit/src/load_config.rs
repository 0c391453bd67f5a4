/// `load_config` module: builds the run's [`HarnessConfig`] from the environment and an
/// optional YAML settings file.
///
/// Credentials only ever come from the environment (`HARNESS_API_TOKEN`,
/// `HARNESS_ACCT_ID`); the settings file tunes connection parameters and never carries
/// secrets.
///
/// # Accepted settings keys
/// ```yaml
/// base_url: https://app.harness.io
/// timeout_secs: 30
/// page_size: 100
/// infra: K8
/// ```
/// All keys are optional; unknown keys are rejected.
///
/// # Errors
/// A missing credential surfaces as [`ConfigError::MissingVar`] (wrapped in `anyhow`), so
/// callers can `downcast_ref` it. File and parse failures carry the path as context.
use anyhow::{Context, Result};
use harness_audit_core::config::{ConfigError, HarnessConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub page_size: Option<u32>,
    pub infra: Option<String>,
}

impl Settings {
    /// Overlays the settings on an env-derived config.
    pub fn apply(self, mut config: HarnessConfig) -> Result<HarnessConfig, ConfigError> {
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url)?;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size)?;
        }
        if let Some(infra) = self.infra {
            config = config.with_infra(infra);
        }
        Ok(config)
    }
}

/// Reads and parses a settings file. An empty file yields default settings.
pub fn read_settings(path: &Path) -> Result<Settings> {
    info!(settings_path = ?path, "Loading settings from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, settings_path = ?path, "Failed to read settings file");
            return Err(e).with_context(|| format!("Failed to read settings file {path:?}"));
        }
    };
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    match serde_yaml::from_str::<Settings>(&content) {
        Ok(settings) => {
            info!(settings_path = ?path, ?settings, "Parsed settings YAML successfully");
            Ok(settings)
        }
        Err(e) => {
            error!(error = ?e, settings_path = ?path, "Failed to parse settings YAML");
            Err(e).with_context(|| format!("Failed to parse settings YAML {path:?}"))
        }
    }
}

/// Environment first, then the settings file on top of it.
pub fn load_config(settings_path: Option<&Path>) -> Result<HarnessConfig> {
    let config = HarnessConfig::from_env()?;
    let config = match settings_path {
        Some(path) => read_settings(path)?.apply(config)?,
        None => config,
    };
    config.trace_loaded();
    Ok(config)
}
