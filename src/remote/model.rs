//! Records exchanged with the remote services

use serde::{Deserialize, Serialize};

/// How a workspace is bound to version control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitLinkDescriptor {
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub repository_name: String,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub directory_name: String,
    #[serde(default)]
    pub git_provider_type: String,
}

impl GitLinkDescriptor {
    /// A link without a provider type cannot be used to create branches.
    pub fn is_usable(&self) -> bool {
        !self.git_provider_type.trim().is_empty()
    }

    /// Same repository and folder, different branch.
    pub fn for_branch(&self, branch: impl Into<String>) -> Self {
        Self {
            branch_name: branch.into(),
            ..self.clone()
        }
    }

    /// `org/project/repo`
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.organization_name, self.project_name, self.repository_name
        )
    }
}

/// A Fabric workspace as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_id: Option<String>,
    #[serde(
        default,
        rename = "gitProviderDetails",
        skip_serializing_if = "Option::is_none"
    )]
    pub git_link: Option<GitLinkDescriptor>,
}

impl Workspace {
    /// Copy of this workspace carrying `link`.
    pub fn with_git_link(&self, link: GitLinkDescriptor) -> Self {
        Self {
            git_link: Some(link),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_id: Option<String>,
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchReference {
    pub name: String,
    pub object_id: String,
}

/// Accepted update-from-git request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncHandle {
    /// Long-running operation id, when the platform runs the sync asynchronously.
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Undefined,
}

impl OperationState {
    pub fn is_finished(self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationState::NotStarted => "not started",
            OperationState::Running => "running",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
            OperationState::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub status: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time_utc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time_utc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}
