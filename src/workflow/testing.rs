//! In-memory fakes of both remote facades

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::session::Clients;
use super::steps::ExecutionPlan;
use crate::remote::{
    BranchReference, CreateWorkspaceRequest, GitLinkDescriptor, OperationState, OperationStatus,
    RemoteError, RepositoryHost, SyncHandle, Workspace, WorkspacePlatform,
};

pub(crate) const BASE_COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

pub(crate) fn sample_link() -> GitLinkDescriptor {
    GitLinkDescriptor {
        organization_name: "A".into(),
        project_name: "P".into(),
        repository_name: "R".into(),
        branch_name: "main".into(),
        directory_name: "/".into(),
        git_provider_type: "AzureDevOps".into(),
    }
}

pub(crate) fn sample_workspace(id: &str, name: &str) -> Workspace {
    Workspace {
        id: id.into(),
        display_name: name.into(),
        description: String::new(),
        kind: "Workspace".into(),
        capacity_id: Some("cap-1".into()),
        git_link: None,
    }
}

pub(crate) fn sample_plan(branch: &str, workspace_name: &str) -> ExecutionPlan {
    ExecutionPlan {
        parent: sample_workspace("ws-dev", "Dev").with_git_link(sample_link()),
        source_link: sample_link(),
        branch_name: branch.into(),
        workspace_name: workspace_name.into(),
    }
}

/// Records every call and fails the methods it is told to fail.
pub(crate) struct FakeBackend {
    workspaces: Vec<Workspace>,
    link: Option<GitLinkDescriptor>,
    operation_id: Option<String>,
    operation_states: Mutex<VecDeque<OperationState>>,
    failing: Vec<&'static str>,
    calls: Mutex<Vec<&'static str>>,
    created_branches: Mutex<Vec<(String, String)>>,
    create_requests: Mutex<Vec<CreateWorkspaceRequest>>,
    linked: Mutex<Vec<(String, GitLinkDescriptor)>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            workspaces: vec![
                sample_workspace("ws-dev", "Dev"),
                sample_workspace("ws-test", "Test"),
            ],
            link: Some(sample_link()),
            operation_id: None,
            operation_states: Mutex::new(VecDeque::new()),
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
            created_branches: Mutex::new(Vec::new()),
            create_requests: Mutex::new(Vec::new()),
            linked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(mut self, method: &'static str) -> Self {
        self.failing.push(method);
        self
    }

    pub(crate) fn with_link(mut self, link: Option<GitLinkDescriptor>) -> Self {
        self.link = link;
        self
    }

    pub(crate) fn with_workspaces(mut self, workspaces: Vec<Workspace>) -> Self {
        self.workspaces = workspaces;
        self
    }

    pub(crate) fn with_operation(mut self, id: &str, states: Vec<OperationState>) -> Self {
        self.operation_id = Some(id.to_string());
        self.operation_states = Mutex::new(states.into());
        self
    }

    pub(crate) fn clients(self: &Arc<Self>) -> Clients {
        Clients {
            platform: self.clone(),
            repos: self.clone(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn created_branches(&self) -> Vec<String> {
        self.created_branch_bases()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// `(branch, base object id)` per created branch
    pub(crate) fn created_branch_bases(&self) -> Vec<(String, String)> {
        self.created_branches.lock().unwrap().clone()
    }

    pub(crate) fn create_requests(&self) -> Vec<CreateWorkspaceRequest> {
        self.create_requests.lock().unwrap().clone()
    }

    pub(crate) fn linked(&self) -> Vec<(String, GitLinkDescriptor)> {
        self.linked.lock().unwrap().clone()
    }

    fn enter(&self, method: &'static str) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(method);
        if self.failing.contains(&method) {
            return Err(RemoteError::Status {
                service: "fake",
                status: 500,
                body: format!("{} exploded", method),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WorkspacePlatform for FakeBackend {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        self.enter("list_workspaces")?;
        Ok(self.workspaces.clone())
    }

    async fn get_git_connection(
        &self,
        _workspace_id: &str,
    ) -> Result<Option<GitLinkDescriptor>, RemoteError> {
        self.enter("get_git_connection")?;
        Ok(self.link.clone())
    }

    async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, RemoteError> {
        self.enter("create_workspace")?;
        self.create_requests.lock().unwrap().push(request.clone());
        Ok(Workspace {
            id: "ws-new".into(),
            display_name: request.display_name.clone(),
            description: request.description.clone(),
            kind: "Workspace".into(),
            capacity_id: request.capacity_id.clone(),
            git_link: None,
        })
    }

    async fn connect_to_git(
        &self,
        workspace_id: &str,
        link: &GitLinkDescriptor,
    ) -> Result<(), RemoteError> {
        self.enter("connect_to_git")?;
        self.linked
            .lock()
            .unwrap()
            .push((workspace_id.to_string(), link.clone()));
        Ok(())
    }

    async fn sync_from_git(&self, _workspace_id: &str) -> Result<SyncHandle, RemoteError> {
        self.enter("sync_from_git")?;
        Ok(SyncHandle {
            operation_id: self.operation_id.clone(),
        })
    }

    async fn get_operation_status(
        &self,
        _operation_id: &str,
    ) -> Result<OperationStatus, RemoteError> {
        self.enter("get_operation_status")?;
        let status = self
            .operation_states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OperationState::Running);
        Ok(OperationStatus {
            status,
            created_time_utc: None,
            last_updated_time_utc: None,
            error: None,
        })
    }
}

#[async_trait]
impl RepositoryHost for FakeBackend {
    async fn get_branch(
        &self,
        _organization: &str,
        _project: &str,
        _repository: &str,
        branch: &str,
    ) -> Result<BranchReference, RemoteError> {
        self.enter("get_branch")?;
        Ok(BranchReference {
            name: crate::remote::qualify_branch_name(branch),
            object_id: BASE_COMMIT.into(),
        })
    }

    async fn create_branch(
        &self,
        _organization: &str,
        _project: &str,
        _repository: &str,
        name: &str,
        base_object_id: &str,
    ) -> Result<BranchReference, RemoteError> {
        self.enter("create_branch")?;
        self.created_branches
            .lock()
            .unwrap()
            .push((name.to_string(), base_object_id.to_string()));
        Ok(BranchReference {
            name: name.to_string(),
            object_id: base_object_id.to_string(),
        })
    }
}
