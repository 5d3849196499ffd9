//! User configuration (~/.fabricant/config.toml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::auth::{DEVOPS_SCOPE, FABRIC_SCOPE};

/// Environment variable that switches auth to a pre-issued token.
pub const TOKEN_ENV: &str = "FABRICANT_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Failed to read config: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub fabric: FabricSection,
    #[serde(default)]
    pub devops: DevOpsSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricSection {
    #[serde(default = "default_fabric_url")]
    pub base_url: String,
    #[serde(default = "default_fabric_scope")]
    pub scope: String,
}

impl Default for FabricSection {
    fn default() -> Self {
        Self {
            base_url: default_fabric_url(),
            scope: default_fabric_scope(),
        }
    }
}

fn default_fabric_url() -> String {
    "https://api.fabric.microsoft.com/v1".to_string()
}

fn default_fabric_scope() -> String {
    FABRIC_SCOPE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevOpsSection {
    /// Organization name is appended per request.
    #[serde(default = "default_devops_url")]
    pub base_url: String,
    #[serde(default = "default_devops_scope")]
    pub scope: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for DevOpsSection {
    fn default() -> Self {
        Self {
            base_url: default_devops_url(),
            scope: default_devops_scope(),
            api_version: default_api_version(),
        }
    }
}

fn default_devops_url() -> String {
    "https://dev.azure.com".to_string()
}

fn default_devops_scope() -> String {
    DEVOPS_SCOPE.to_string()
}

fn default_api_version() -> String {
    "7.1".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    #[default]
    AzureCli,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub provider: TokenSource,
    #[serde(default = "default_az_command")]
    pub az_command: String,
    /// Only read when `provider = "static"`.
    pub token: Option<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            provider: TokenSource::default(),
            az_command: default_az_command(),
            token: None,
        }
    }
}

fn default_az_command() -> String {
    "az".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpSection {
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl HttpSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    /// Poll the update-from-git operation until it finishes before reporting success.
    #[serde(default)]
    pub wait_for_completion: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            wait_for_completion: false,
            poll_interval_secs: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_polls() -> u32 {
    60
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".fabricant").join("config.toml"))
    }

    /// Load config from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.display().to_string()));
                }
                Self::from_file(p)?
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(std::env::var(TOKEN_ENV).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// A token in the environment wins over the configured provider.
    pub fn apply_env(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.auth.provider = TokenSource::Static;
            self.auth.token = Some(token);
        }
    }
}
