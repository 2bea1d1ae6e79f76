//! Engine configuration
//!
//! Settings are read from `nodeql.toml` in the configuration directory.
//! Every key is optional.
//!
//! ## Environment Variables
//!
//! The following environment variables override config file settings:
//!
//! - `NODEQL_LOG` - tracing filter directive (e.g. `nodeql=debug`)
//! - `NODEQL_DEFAULT_PAGE_SIZE` - page size for `nodes` and connection listings
//! - `NODEQL_MAX_PAGE_SIZE` - upper bound for the `first` parameter
//! - `NODEQL_HISTORY_FILE` - REPL history file
//!
//! These can be set in a `.env` file in the configuration directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "nodeql.toml";

/// Environment variable names
pub const ENV_LOG: &str = "NODEQL_LOG";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "NODEQL_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "NODEQL_MAX_PAGE_SIZE";
pub const ENV_HISTORY_FILE: &str = "NODEQL_HISTORY_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// REPL history file; no history is kept when unset
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

fn default_log_filter() -> String {
    "nodeql=info".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            history_file: None,
        }
    }
}

/// Page sizes used by listing calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: usize,
    pub max_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
            max_size: default_max_page_size(),
        }
    }
}

impl PageLimits {
    /// Page size for a requested `first`, capped at the maximum
    pub fn page_size(&self, first: Option<usize>) -> usize {
        first.unwrap_or(self.default_size).min(self.max_size)
    }
}

impl EngineConfig {
    /// Load configuration from a directory
    ///
    /// This also loads any `.env` file in the directory and applies
    /// environment variable overrides. A missing config file is not an error.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        // Load env file if present (ignore errors)
        let env_path = dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides looked up by environment variable name
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(filter) = var(ENV_LOG) {
            if !filter.is_empty() {
                self.log_filter = filter;
            }
        }

        if let Some(size) = var(ENV_DEFAULT_PAGE_SIZE).and_then(|s| s.parse().ok()) {
            self.default_page_size = size;
        }

        if let Some(size) = var(ENV_MAX_PAGE_SIZE).and_then(|s| s.parse().ok()) {
            self.max_page_size = size;
        }

        if let Some(path) = var(ENV_HISTORY_FILE) {
            if !path.is_empty() {
                self.history_file = Some(PathBuf::from(path));
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            anyhow::bail!("Page sizes must be greater than zero");
        }
        if self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default_page_size ({}) is larger than max_page_size ({})",
                self.default_page_size,
                self.max_page_size
            );
        }
        Ok(())
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }
}
