//! YAML configuration.
//!
//! ```yaml
//! token: <personal access token>
//! organization: contoso
//! cache_dir: cache
//! ```
//!
//! Only `token` and `organization` are required.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{DAY, Endpoints, HOUR};
use crate::error::BrowserError;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_INTERACTIVE_DOMAIN: &str = "Windows Live ID";

const MISSING_CONFIG: &str =
    "Please copy config-sample.yaml to config.yaml and update it with your values.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowserConfig {
    pub token: String,
    pub organization: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_interactive_domain")]
    pub interactive_domain: String,
    #[serde(default = "default_request_ttl_secs")]
    pub request_ttl_secs: u64,
    #[serde(default = "default_collection_ttl_secs")]
    pub collection_ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_interactive_domain() -> String {
    DEFAULT_INTERACTIVE_DOMAIN.to_string()
}

fn default_request_ttl_secs() -> u64 {
    HOUR.as_secs()
}

fn default_collection_ttl_secs() -> u64 {
    30 * DAY.as_secs()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl BrowserConfig {
    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, BrowserError> {
        if !path.exists() {
            return Err(BrowserError::Configuration(MISSING_CONFIG.to_string()));
        }
        let text = fs::read_to_string(path).map_err(|e| {
            BrowserError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, BrowserError> {
        let config: BrowserConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), BrowserError> {
        if self.token.trim().is_empty() {
            return Err(BrowserError::Configuration("'token' must not be empty".to_string()));
        }
        if self.organization.trim().is_empty() {
            return Err(BrowserError::Configuration(
                "'organization' must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_ttl(&self) -> Duration {
        Duration::from_secs(self.request_ttl_secs)
    }

    pub fn collection_ttl(&self) -> Duration {
        Duration::from_secs(self.collection_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
