//! Azure DevOps git refs client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::client::ApiClient;
use super::error::RemoteError;
use super::model::BranchReference;
use super::RepositoryHost;
use crate::auth::TokenProvider;
use crate::config::DevOpsSection;

const SERVICE: &str = "devops";

/// Canonical prefix of branch refs
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Old object id used when creating a ref
const ZERO_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

/// `feature/x` and `refs/heads/feature/x` both become `refs/heads/feature/x`.
pub fn qualify_branch_name(name: &str) -> String {
    if name.starts_with(BRANCH_REF_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", BRANCH_REF_PREFIX, name)
    }
}

/// Inverse of [`qualify_branch_name`].
pub fn short_branch_name(name: &str) -> &str {
    name.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(name)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitRef {
    name: String,
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct GitRefsResponse {
    #[serde(default)]
    value: Vec<GitRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GitRefUpdate<'a> {
    name: &'a str,
    old_object_id: &'a str,
    new_object_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitRefUpdateResult {
    name: String,
    #[serde(default)]
    new_object_id: String,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    update_status: String,
    #[serde(default)]
    custom_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitRefUpdateResponse {
    #[serde(default)]
    value: Vec<GitRefUpdateResult>,
}

pub struct DevOpsClient {
    api: ApiClient,
    api_version: String,
}

impl DevOpsClient {
    pub fn new(
        section: &DevOpsSection,
        tokens: Arc<dyn TokenProvider>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            api: ApiClient::new(
                SERVICE,
                &section.base_url,
                section.scope.clone(),
                tokens,
                timeout,
            )?,
            api_version: section.api_version.clone(),
        })
    }
}

#[async_trait]
impl RepositoryHost for DevOpsClient {
    /// GET /{org}/{project}/_apis/git/repositories/{repo}/refs?filter=heads/{branch}
    async fn get_branch(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
        branch: &str,
    ) -> Result<BranchReference, RemoteError> {
        let short = short_branch_name(branch);
        let filter = format!("heads/{}", short);
        let url = self.api.url(
            &[organization, project, "_apis", "git", "repositories", repository, "refs"],
            &[("filter", filter.as_str()), ("api-version", self.api_version.as_str())],
        );
        let response = self.api.get(url).await?;
        let refs: GitRefsResponse = self.api.decode(response).await?;

        // The filter is a prefix match: heads/main also returns heads/main-old.
        let wanted = qualify_branch_name(short);
        refs.value
            .into_iter()
            .find(|r| r.name == wanted)
            .map(|r| BranchReference {
                name: r.name,
                object_id: r.object_id,
            })
            .ok_or_else(|| {
                RemoteError::NotFound(format!(
                    "branch {} not found in repo {}",
                    branch, repository
                ))
            })
    }

    /// POST /{org}/{project}/_apis/git/repositories/{repo}/refs
    async fn create_branch(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
        name: &str,
        base_object_id: &str,
    ) -> Result<BranchReference, RemoteError> {
        let full_name = qualify_branch_name(name);
        let updates = [GitRefUpdate {
            name: &full_name,
            old_object_id: ZERO_OBJECT_ID,
            new_object_id: base_object_id,
        }];
        let url = self.api.url(
            &[organization, project, "_apis", "git", "repositories", repository, "refs"],
            &[("api-version", self.api_version.as_str())],
        );
        let response = self.api.post(url, &updates).await?;
        let result: GitRefUpdateResponse = self.api.decode(response).await?;

        let update = result
            .value
            .into_iter()
            .find(|u| u.name == full_name)
            .ok_or_else(|| RemoteError::Decode {
                service: SERVICE,
                message: format!("no update result for {}", full_name),
            })?;

        if !update.success {
            return Err(RemoteError::Rejected {
                service: SERVICE,
                message: update
                    .custom_message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("{} ({})", full_name, update.update_status)),
            });
        }

        info!(branch = %full_name, base = base_object_id, "Branch created");
        Ok(BranchReference {
            name: full_name,
            object_id: if update.new_object_id.is_empty() {
                base_object_id.to_string()
            } else {
                update.new_object_id
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_branch_name_is_idempotent() {
        assert_eq!(qualify_branch_name("feature/x"), "refs/heads/feature/x");
        assert_eq!(
            qualify_branch_name("refs/heads/feature/x"),
            qualify_branch_name("feature/x")
        );
        assert_eq!(
            qualify_branch_name(&qualify_branch_name("main")),
            "refs/heads/main"
        );
    }

    #[test]
    fn test_short_branch_name() {
        assert_eq!(short_branch_name("refs/heads/feature/x"), "feature/x");
        assert_eq!(short_branch_name("feature/x"), "feature/x");
    }
}
