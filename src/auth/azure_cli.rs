use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AccessToken, AuthError, TokenProvider};

/// Tokens from the signed-in `az` CLI context (`az login`).
pub struct AzureCliTokenProvider {
    program: PathBuf,
}

/// `az account get-access-token --output json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    /// Local time, e.g. "2024-05-01 10:15:00.000000". Older CLI versions only.
    #[serde(default)]
    expires_on: Option<String>,
    /// Unix seconds. Newer CLI versions.
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
}

impl AzureCliTokenProvider {
    /// Resolve `command` on PATH so a missing CLI fails at start-up rather than on the first call.
    pub fn detect(command: &str) -> Result<Self, AuthError> {
        let program = which::which(command)
            .map_err(|e| AuthError::NotInstalled(format!("{}: {}", command, e)))?;
        debug!(program = %program.display(), "Using Azure CLI credential");
        Ok(Self { program })
    }
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        if scopes.is_empty() {
            return Err(AuthError::NoScopes);
        }

        let output = Command::new(&self.program)
            .args(["account", "get-access-token", "--output", "json", "--scope"])
            .args(scopes)
            .output()
            .await
            .map_err(|e| AuthError::Launch(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(scopes = ?scopes, error = %stderr, "az get-access-token failed");
            return Err(AuthError::CommandFailed(if stderr.is_empty() {
                format!("exit status {:?}", output.status.code())
            } else {
                stderr
            }));
        }

        parse_cli_token(&output.stdout)
    }
}

/// Parse the JSON printed by `az account get-access-token`.
pub fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken, AuthError> {
    let response: CliTokenResponse =
        serde_json::from_slice(stdout).map_err(|e| AuthError::Parse(e.to_string()))?;

    if response.access_token.is_empty() {
        return Err(AuthError::Parse("empty accessToken".to_string()));
    }

    let expires_on = response
        .expires_on_unix
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .or_else(|| {
            response.expires_on.as_deref().and_then(|s| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
        });

    Ok(AccessToken {
        token: response.access_token,
        expires_on,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_cli_output() {
        let json = br#"{
            "accessToken": "eyJ0eXAi",
            "expiresOn": "2024-05-01 10:15:00.000000",
            "expires_on": 1714558500,
            "subscription": "sub",
            "tenant": "tenant",
            "tokenType": "Bearer"
        }"#;
        let token = parse_cli_token(json).unwrap();
        assert_eq!(token.token, "eyJ0eXAi");
        assert_eq!(token.expires_on.unwrap().timestamp(), 1714558500);
    }

    #[test]
    fn test_parse_old_cli_output() {
        let json = br#"{"accessToken":"tok","expiresOn":"2024-05-01 10:15:00.123456"}"#;
        let token = parse_cli_token(json).unwrap();
        assert_eq!(token.token, "tok");
        assert!(token.expires_on.is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_cli_token(b"ERROR: Please run 'az login'"),
            Err(AuthError::Parse(_))
        ));
        assert!(matches!(
            parse_cli_token(br#"{"accessToken":""}"#),
            Err(AuthError::Parse(_))
        ));
    }
}
