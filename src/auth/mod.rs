//! Bearer token acquisition
//!
//! Facades ask a [`TokenProvider`] for a token right before every request.
//! Nothing here caches: the Azure CLI keeps its own token cache.

mod azure_cli;

pub use azure_cli::{parse_cli_token, AzureCliTokenProvider};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AuthSection, TokenSource};

/// Target scope for Azure DevOps REST APIs.
pub const DEVOPS_SCOPE: &str = "499b84ac-1321-427f-aa17-267ca6975798/.default";

/// Target scope for Fabric (and Power BI) REST APIs.
pub const FABRIC_SCOPE: &str = "https://api.fabric.microsoft.com/.default";

#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Token command not found: {0}")]
    NotInstalled(String),
    #[error("Failed to run token command: {0}")]
    Launch(String),
    #[error("Token command failed: {0}")]
    CommandFailed(String),
    #[error("Failed to parse token response: {0}")]
    Parse(String),
    #[error("No scopes requested")]
    NoScopes,
    #[error("No static token configured (set auth.token or FABRICANT_TOKEN)")]
    MissingToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token valid for all of `scopes`.
    async fn token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError>;
}

/// Serves one pre-issued token for every scope.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        if scopes.is_empty() {
            return Err(AuthError::NoScopes);
        }
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
        })
    }
}

/// Build the provider selected in `[auth]`.
pub fn provider_from_config(section: &AuthSection) -> Result<Arc<dyn TokenProvider>, AuthError> {
    match section.provider {
        TokenSource::AzureCli => Ok(Arc::new(AzureCliTokenProvider::detect(
            &section.az_command,
        )?)),
        TokenSource::Static => {
            let token = section
                .token
                .clone()
                .filter(|t| !t.trim().is_empty())
                .ok_or(AuthError::MissingToken)?;
            Ok(Arc::new(StaticTokenProvider::new(token)))
        }
    }
}
