use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

pub const API_KEY_VAR: &str = "HARNESS_API_TOKEN";
pub const ACCOUNT_ID_VAR: &str = "HARNESS_ACCT_ID";
pub const BASE_URL_VAR: &str = "HARNESS_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://app.harness.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_INFRA: &str = "K8";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything a run needs to talk to the platform. Built once at start-up and
/// handed to every component by reference.
#[derive(Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub account_id: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub page_size: u32,
    pub infra: String,
}

impl HarnessConfig {
    pub fn new(account_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            infra: DEFAULT_INFRA.to_string(),
        }
    }

    /// Reads credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_VAR).ok_or_else(|| {
            error!(var = API_KEY_VAR, "API key environment variable not set");
            ConfigError::MissingVar(API_KEY_VAR)
        })?;
        let account_id = get(ACCOUNT_ID_VAR).ok_or_else(|| {
            error!(var = ACCOUNT_ID_VAR, "Account id environment variable not set");
            ConfigError::MissingVar(ACCOUNT_ID_VAR)
        })?;

        let mut config = Self::new(account_id, api_key);
        if let Some(base_url) = get(BASE_URL_VAR) {
            config = config.with_base_url(base_url)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "timeout",
                reason: "must be greater than zero".into(),
            });
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, ConfigError> {
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be greater than zero".into(),
            });
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn with_infra(mut self, infra: impl Into<String>) -> Self {
        self.infra = infra.into();
        self
    }

    pub fn trace_loaded(&self) {
        info!(
            account_id = %self.account_id,
            base_url = %self.base_url,
            page_size = self.page_size,
            timeout_secs = self.timeout.as_secs(),
            "Loaded HarnessConfig"
        );
        debug!(?self, "HarnessConfig loaded (full debug)");
    }
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .field("infra", &self.infra)
            .finish()
    }
}
