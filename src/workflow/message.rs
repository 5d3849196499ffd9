use super::error::{StepFailure, WorkflowError};
use super::session::{Clients, ProgressEntry};
use super::steps::ExecutionPlan;
use crate::remote::{GitLinkDescriptor, Workspace};

/// Which text input a confirmation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    BranchName,
    WorkspaceName,
}

/// Everything the controller reacts to: presentation events and task results.
#[derive(Debug)]
pub enum Message {
    ClientsReady(Clients),
    /// Initialization or fetch failure reported by a task
    Failed(WorkflowError),
    WorkspacesLoaded(Vec<Workspace>),
    /// Enter on the workspace list; `None` when nothing is highlighted
    SelectionConfirmed(Option<usize>),
    GitLinkLoaded(Option<GitLinkDescriptor>),
    TextConfirmed { field: TextField, value: String },
    StepCompleted(ProgressEntry),
    SequenceFailed(StepFailure),
    SequenceSucceeded(String),
    Resize { width: u16, height: u16 },
    Abort,
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::ClientsReady(_) => "clients_ready",
            Message::Failed(_) => "failed",
            Message::WorkspacesLoaded(_) => "workspaces_loaded",
            Message::SelectionConfirmed(_) => "selection_confirmed",
            Message::GitLinkLoaded(_) => "git_link_loaded",
            Message::TextConfirmed { .. } => "text_confirmed",
            Message::StepCompleted(_) => "step_completed",
            Message::SequenceFailed(_) => "sequence_failed",
            Message::SequenceSucceeded(_) => "sequence_succeeded",
            Message::Resize { .. } => "resize",
            Message::Abort => "abort",
        }
    }

    /// Last message a dispatched task sends
    pub fn ends_task(&self) -> bool {
        matches!(
            self,
            Message::ClientsReady(_)
                | Message::Failed(_)
                | Message::WorkspacesLoaded(_)
                | Message::GitLinkLoaded(_)
                | Message::SequenceFailed(_)
                | Message::SequenceSucceeded(_)
        )
    }
}

/// Asynchronous work the controller asks the runtime to perform
#[derive(Debug, Clone)]
pub enum Task {
    InitClients,
    ListWorkspaces,
    FetchGitLink { workspace_id: String },
    Execute(ExecutionPlan),
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::InitClients => "init_clients",
            Task::ListWorkspaces => "list_workspaces",
            Task::FetchGitLink { .. } => "fetch_git_link",
            Task::Execute(_) => "execute",
        }
    }
}

/// Zero or one follow-up per processed message
#[derive(Debug, Clone)]
pub enum Effect {
    None,
    Dispatch(Task),
    /// Seed a text input with a default value
    Prefill { field: TextField, value: String },
    Quit,
}
