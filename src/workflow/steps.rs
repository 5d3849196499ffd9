//! Execution sequence
//!
//! Once both names are confirmed the workflow runs five remote calls in a
//! fixed order. Each call is a [`Step`]; [`execute`] walks [`Step::ALL`],
//! reports every completed step and stops at the first failure. Nothing is
//! rolled back: a branch created by step 2 survives a failure in step 3.

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::StepFailure;
use super::session::{Clients, ProgressEntry};
use crate::config::SyncSection;
use crate::remote::{
    qualify_branch_name, short_branch_name, BranchReference, CreateWorkspaceRequest,
    GitLinkDescriptor, OperationState, RemoteError, SyncHandle, Workspace, WorkspacePlatform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ResolveBaseCommit,
    CreateBranch,
    CreateWorkspace,
    LinkGit,
    SyncFromGit,
}

impl Step {
    /// Execution order
    pub const ALL: [Step; 5] = [
        Step::ResolveBaseCommit,
        Step::CreateBranch,
        Step::CreateWorkspace,
        Step::LinkGit,
        Step::SyncFromGit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::ResolveBaseCommit => "resolving base commit",
            Step::CreateBranch => "creating branch",
            Step::CreateWorkspace => "creating workspace",
            Step::LinkGit => "linking workspace to git",
            Step::SyncFromGit => "syncing workspace from git",
        }
    }

    /// 1-based position in [`Step::ALL`]
    pub fn position(self) -> usize {
        Step::ALL
            .iter()
            .position(|s| *s == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs of the sequence, captured from the session when it is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub parent: Workspace,
    /// Git link of the parent workspace
    pub source_link: GitLinkDescriptor,
    /// As typed by the user, with or without `refs/heads/`
    pub branch_name: String,
    pub workspace_name: String,
}

impl ExecutionPlan {
    pub fn qualified_branch(&self) -> String {
        qualify_branch_name(&self.branch_name)
    }

    pub fn short_branch(&self) -> &str {
        short_branch_name(&self.branch_name)
    }

    pub fn description(&self) -> String {
        format!(
            "Feature workspace for {} (Parent: {})",
            self.short_branch(),
            self.parent.display_name
        )
    }

    pub fn create_request(&self) -> CreateWorkspaceRequest {
        CreateWorkspaceRequest {
            display_name: self.workspace_name.clone(),
            description: self.description(),
            capacity_id: self.parent.capacity_id.clone(),
        }
    }

    /// Parent's repository, new branch
    pub fn target_link(&self) -> GitLinkDescriptor {
        self.source_link.for_branch(self.short_branch())
    }
}

/// Whether step 5 waits for the platform to finish the sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub wait_for_completion: bool,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::from(&SyncSection::default())
    }
}

impl From<&SyncSection> for SyncPolicy {
    fn from(section: &SyncSection) -> Self {
        Self {
            wait_for_completion: section.wait_for_completion,
            poll_interval: Duration::from_secs(section.poll_interval_secs),
            max_polls: section.max_polls.max(1),
        }
    }
}

/// Results handed from one step to the next
#[derive(Debug, Default)]
struct Outputs {
    base: Option<BranchReference>,
    branch: Option<BranchReference>,
    workspace: Option<Workspace>,
    sync: Option<SyncHandle>,
    /// The platform reported the sync finished, or ran it without an operation
    sync_completed: bool,
}

fn earlier<'a, T>(value: &'a Option<T>, what: &str) -> Result<&'a T, RemoteError> {
    value
        .as_ref()
        .ok_or_else(|| RemoteError::Internal(format!("{} missing from an earlier step", what)))
}

fn short_sha(object_id: &str) -> &str {
    object_id.get(..8).unwrap_or(object_id)
}

impl Step {
    async fn run(
        self,
        plan: &ExecutionPlan,
        clients: &Clients,
        policy: &SyncPolicy,
        out: &mut Outputs,
    ) -> Result<String, RemoteError> {
        let link = &plan.source_link;
        match self {
            Step::ResolveBaseCommit => {
                let base = clients
                    .repos
                    .get_branch(
                        &link.organization_name,
                        &link.project_name,
                        &link.repository_name,
                        &link.branch_name,
                    )
                    .await?;
                let message = format!(
                    "Resolved {} at {}",
                    short_branch_name(&base.name),
                    short_sha(&base.object_id)
                );
                out.base = Some(base);
                Ok(message)
            }
            Step::CreateBranch => {
                let base_commit = earlier(&out.base, "base commit")?.object_id.clone();
                let created = clients
                    .repos
                    .create_branch(
                        &link.organization_name,
                        &link.project_name,
                        &link.repository_name,
                        &plan.qualified_branch(),
                        &base_commit,
                    )
                    .await?;
                let message = format!(
                    "Created branch {} from {}",
                    created.name,
                    short_sha(&base_commit)
                );
                out.branch = Some(created);
                Ok(message)
            }
            Step::CreateWorkspace => {
                let workspace = clients
                    .platform
                    .create_workspace(&plan.create_request())
                    .await?;
                let message = format!(
                    "Created workspace '{}' ({})",
                    workspace.display_name, workspace.id
                );
                out.workspace = Some(workspace);
                Ok(message)
            }
            Step::LinkGit => {
                let workspace_id = earlier(&out.workspace, "new workspace")?.id.clone();
                let target = plan.target_link();
                clients
                    .platform
                    .connect_to_git(&workspace_id, &target)
                    .await?;
                Ok(format!(
                    "Linked workspace to {} on {}",
                    target.repository_path(),
                    target.branch_name
                ))
            }
            Step::SyncFromGit => {
                let workspace_id = earlier(&out.workspace, "new workspace")?.id.clone();
                let handle = clients.platform.sync_from_git(&workspace_id).await?;
                let (message, completed) =
                    match (&handle.operation_id, policy.wait_for_completion) {
                        (Some(operation_id), true) => {
                            wait_for_operation(clients.platform.as_ref(), operation_id, policy)
                                .await?;
                            let message =
                                format!("Synced workspace from git (operation {})", operation_id);
                            (message, true)
                        }
                        (Some(operation_id), false) => {
                            let message =
                                format!("Started sync from git (operation {})", operation_id);
                            (message, false)
                        }
                        (None, _) => ("Synced workspace from git".to_string(), true),
                    };
                out.sync = Some(handle);
                out.sync_completed = completed;
                Ok(message)
            }
        }
    }
}

/// Poll a long-running operation until it succeeds, fails or the poll budget runs out.
async fn wait_for_operation(
    platform: &dyn WorkspacePlatform,
    operation_id: &str,
    policy: &SyncPolicy,
) -> Result<(), RemoteError> {
    let max_polls = policy.max_polls.max(1);
    for attempt in 1..=max_polls {
        tokio::time::sleep(policy.poll_interval).await;
        let status = platform.get_operation_status(operation_id).await?;
        debug!(
            operation = operation_id,
            attempt,
            state = status.status.as_str(),
            "Polled sync operation"
        );

        if !status.status.is_finished() {
            continue;
        }
        if status.status == OperationState::Succeeded {
            return Ok(());
        }
        return Err(RemoteError::Operation {
            operation_id: operation_id.to_string(),
            state: status.status.as_str().to_string(),
            message: status
                .error
                .map(|e| format!("{} {}", e.error_code, e.message).trim().to_string())
                .unwrap_or_default(),
        });
    }

    Err(RemoteError::Operation {
        operation_id: operation_id.to_string(),
        state: "did not finish".to_string(),
        message: format!("still running after {} polls", max_polls),
    })
}

fn summary(plan: &ExecutionPlan, out: &Outputs) -> String {
    let branch = out
        .branch
        .as_ref()
        .map(|b| b.name.clone())
        .unwrap_or_else(|| plan.qualified_branch());
    let workspace = out
        .workspace
        .as_ref()
        .map(|w| format!("'{}' ({})", w.display_name, w.id))
        .unwrap_or_else(|| format!("'{}'", plan.workspace_name));
    let operation_id = out.sync.as_ref().and_then(|s| s.operation_id.as_deref());

    match (out.sync_completed, operation_id) {
        (true, Some(operation_id)) => format!(
            "Branch {} and workspace {} created and synced successfully! Sync operation: {}",
            branch, workspace, operation_id
        ),
        (true, None) => format!(
            "Branch {} and workspace {} created and synced successfully!",
            branch, workspace
        ),
        (false, operation_id) => format!(
            "Branch {} and workspace {} created; sync from git started (operation {}).",
            branch,
            workspace,
            operation_id.unwrap_or("unknown")
        ),
    }
}

/// Run every step in order, calling `on_step` after each success.
///
/// Returns the success summary, or the first failing step with its cause.
pub async fn execute<F>(
    plan: &ExecutionPlan,
    clients: &Clients,
    policy: &SyncPolicy,
    mut on_step: F,
) -> Result<String, StepFailure>
where
    F: FnMut(ProgressEntry) + Send,
{
    let mut outputs = Outputs::default();

    for step in Step::ALL {
        info!(step = step.label(), position = step.position(), "Executing step");
        match step.run(plan, clients, policy, &mut outputs).await {
            Ok(message) => on_step(ProgressEntry { step, message }),
            Err(cause) => {
                warn!(step = step.label(), error = %cause, "Step failed, aborting sequence");
                return Err(StepFailure { step, cause });
            }
        }
    }

    let summary = summary(plan, &outputs);
    info!(summary = %summary, "Execution sequence completed");
    Ok(summary)
}
