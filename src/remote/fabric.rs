//! Fabric REST v1 client (workspaces, git integration, operations)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::client::{has_body, ApiClient};
use super::error::RemoteError;
use super::model::{
    CreateWorkspaceRequest, GitLinkDescriptor, OperationStatus, SyncHandle, Workspace,
};
use super::WorkspacePlatform;
use crate::auth::TokenProvider;
use crate::config::FabricSection;

const SERVICE: &str = "fabric";

/// Header carrying the long-running operation id
pub const OPERATION_ID_HEADER: &str = "x-ms-operation-id";

#[derive(Debug, Deserialize)]
struct WorkspaceListResponse {
    #[serde(default)]
    value: Vec<Workspace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitConnectionResponse {
    #[serde(default)]
    git_provider_details: Option<GitLinkDescriptor>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectToGitRequest<'a> {
    git_provider_details: &'a GitLinkDescriptor,
}

/// Response of `git/initializeConnection`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeConnectionResponse {
    /// "None", "UpdateFromGit" or "CommitToGit"
    #[serde(default)]
    pub required_action: String,
    #[serde(default)]
    pub workspace_head: Option<String>,
    #[serde(default)]
    pub remote_commit_hash: Option<String>,
}

/// Response of `git/status`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    #[serde(default)]
    pub workspace_head: Option<String>,
    #[serde(default)]
    pub remote_commit_hash: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConflictResolution {
    conflict_resolution_type: &'static str,
    conflict_resolution_policy: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOptions {
    allow_override_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFromGitRequest {
    remote_commit_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_head: Option<String>,
    conflict_resolution: ConflictResolution,
    options: UpdateOptions,
}

pub struct FabricClient {
    api: ApiClient,
}

impl FabricClient {
    pub fn new(
        section: &FabricSection,
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
        })
    }

    /// GET /workspaces/{id}
    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace, RemoteError> {
        let url = self.api.url(&["workspaces", workspace_id], &[]);
        let response = self.api.get(url).await?;
        self.api.decode(response).await
    }

    /// GET /workspaces/{id}/git/status
    pub async fn get_git_status(&self, workspace_id: &str) -> Result<GitStatus, RemoteError> {
        let url = self.api.url(&["workspaces", workspace_id, "git", "status"], &[]);
        let response = self.api.get(url).await?;
        if !has_body(&response) {
            return Ok(GitStatus::default());
        }
        self.api.decode(response).await
    }

    /// POST /workspaces/{id}/git/initializeConnection
    pub async fn initialize_connection(
        &self,
        workspace_id: &str,
    ) -> Result<InitializeConnectionResponse, RemoteError> {
        let url = self.api.url(
            &["workspaces", workspace_id, "git", "initializeConnection"],
            &[],
        );
        let response = self.api.post(url, &serde_json::json!({})).await?;
        if !has_body(&response) {
            return Ok(InitializeConnectionResponse::default());
        }
        self.api.decode(response).await
    }

    /// POST /workspaces/{id}/git/updateFromGit, preferring remote content on conflict.
    pub async fn update_from_git(
        &self,
        workspace_id: &str,
        remote_commit_hash: &str,
        workspace_head: Option<&str>,
    ) -> Result<SyncHandle, RemoteError> {
        let url = self
            .api
            .url(&["workspaces", workspace_id, "git", "updateFromGit"], &[]);
        let request = UpdateFromGitRequest {
            remote_commit_hash: remote_commit_hash.to_string(),
            workspace_head: workspace_head
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            conflict_resolution: ConflictResolution {
                conflict_resolution_type: "Workspace",
                conflict_resolution_policy: "PreferRemote",
            },
            options: UpdateOptions {
                allow_override_items: true,
            },
        };
        let response = self.api.post(url, &request).await?;

        let operation_id = response
            .headers()
            .get(OPERATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        debug!(
            workspace = workspace_id,
            status = response.status().as_u16(),
            operation = ?operation_id,
            "updateFromGit accepted"
        );

        Ok(SyncHandle { operation_id })
    }
}

#[async_trait]
impl WorkspacePlatform for FabricClient {
    /// GET /workspaces
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        let url = self.api.url(&["workspaces"], &[]);
        let response = self.api.get(url).await?;
        let list: WorkspaceListResponse = self.api.decode(response).await?;
        Ok(list.value)
    }

    /// GET /workspaces/{id}/git/connection
    async fn get_git_connection(
        &self,
        workspace_id: &str,
    ) -> Result<Option<GitLinkDescriptor>, RemoteError> {
        let url = self
            .api
            .url(&["workspaces", workspace_id, "git", "connection"], &[]);
        let response = self.api.get(url).await?;
        let connection: GitConnectionResponse = self.api.decode(response).await?;
        Ok(connection.git_provider_details)
    }

    /// POST /workspaces
    async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, RemoteError> {
        let url = self.api.url(&["workspaces"], &[]);
        let response = self.api.post(url, request).await?;
        let workspace: Workspace = self.api.decode(response).await?;
        info!(id = %workspace.id, name = %workspace.display_name, "Workspace created");
        Ok(workspace)
    }

    /// POST /workspaces/{id}/git/connect
    async fn connect_to_git(
        &self,
        workspace_id: &str,
        link: &GitLinkDescriptor,
    ) -> Result<(), RemoteError> {
        let url = self
            .api
            .url(&["workspaces", workspace_id, "git", "connect"], &[]);
        self.api
            .post(
                url,
                &ConnectToGitRequest {
                    git_provider_details: link,
                },
            )
            .await?;
        Ok(())
    }

    /// Initialize the fresh connection, then update from the remote commit it reports.
    async fn sync_from_git(&self, workspace_id: &str) -> Result<SyncHandle, RemoteError> {
        let init = self.initialize_connection(workspace_id).await?;
        debug!(
            workspace = workspace_id,
            required_action = %init.required_action,
            "Git connection initialized"
        );

        let (remote, head) = match init.remote_commit_hash.filter(|h| !h.is_empty()) {
            Some(hash) => (hash, init.workspace_head),
            None => {
                let status = self.get_git_status(workspace_id).await?;
                let hash = status
                    .remote_commit_hash
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| RemoteError::Decode {
                        service: SERVICE,
                        message: "git status has no remoteCommitHash".to_string(),
                    })?;
                (hash, status.workspace_head)
            }
        };

        self.update_from_git(workspace_id, &remote, head.as_deref())
            .await
    }

    /// GET /operations/{id}
    async fn get_operation_status(
        &self,
        operation_id: &str,
    ) -> Result<OperationStatus, RemoteError> {
        let url = self.api.url(&["operations", operation_id], &[]);
        let response = self.api.get(url).await?;
        self.api.decode(response).await
    }
}
