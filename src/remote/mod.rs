//! Remote service facades
//!
//! Two REST services are involved:
//! - the workspace platform (Fabric): workspaces, git connections, sync
//! - the repository host (Azure DevOps): branch refs
//!
//! The workflow only sees the [`WorkspacePlatform`] and [`RepositoryHost`]
//! traits; [`FabricClient`] and [`DevOpsClient`] are the HTTP implementations.

pub mod client;
pub mod devops;
pub mod error;
pub mod fabric;
pub mod model;

pub use client::ApiClient;
pub use devops::{qualify_branch_name, short_branch_name, DevOpsClient, BRANCH_REF_PREFIX};
pub use error::RemoteError;
pub use fabric::FabricClient;
pub use model::{
    BranchReference, CreateWorkspaceRequest, GitLinkDescriptor, OperationState, OperationStatus,
    SyncHandle, Workspace,
};

use async_trait::async_trait;

#[async_trait]
pub trait WorkspacePlatform: Send + Sync {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError>;

    /// `None` when the workspace is not connected to git.
    async fn get_git_connection(
        &self,
        workspace_id: &str,
    ) -> Result<Option<GitLinkDescriptor>, RemoteError>;

    async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, RemoteError>;

    async fn connect_to_git(
        &self,
        workspace_id: &str,
        link: &GitLinkDescriptor,
    ) -> Result<(), RemoteError>;

    /// Start updating workspace content from its connected branch.
    async fn sync_from_git(&self, workspace_id: &str) -> Result<SyncHandle, RemoteError>;

    async fn get_operation_status(&self, operation_id: &str)
        -> Result<OperationStatus, RemoteError>;
}

#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Current head of `branch` (short or fully qualified name).
    async fn get_branch(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
        branch: &str,
    ) -> Result<BranchReference, RemoteError>;

    /// Create `name` pointing at `base_object_id`.
    async fn create_branch(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
        name: &str,
        base_object_id: &str,
    ) -> Result<BranchReference, RemoteError>;
}
