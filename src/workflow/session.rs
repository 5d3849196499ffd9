//! Session state for one workflow run

use std::fmt;
use std::sync::Arc;

use super::error::WorkflowError;
use super::steps::Step;
use crate::remote::{RepositoryHost, Workspace, WorkspacePlatform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    LoadingWorkspaces,
    SelectWorkspace,
    LoadingGitLink,
    EnterBranchName,
    EnterWorkspaceName,
    Executing,
    Done,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::LoadingWorkspaces => "loading_workspaces",
            Phase::SelectWorkspace => "select_workspace",
            Phase::LoadingGitLink => "loading_git_link",
            Phase::EnterBranchName => "enter_branch_name",
            Phase::EnterWorkspaceName => "enter_workspace_name",
            Phase::Executing => "executing",
            Phase::Done => "done",
            Phase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Error)
    }

    /// A remote call is outstanding while in this phase.
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            Phase::Init | Phase::LoadingWorkspaces | Phase::LoadingGitLink | Phase::Executing
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed execution step, display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub step: Step,
    pub message: String,
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Authenticated facades, set once per session.
#[derive(Clone)]
pub struct Clients {
    pub platform: Arc<dyn WorkspacePlatform>,
    pub repos: Arc<dyn RepositoryHost>,
}

impl fmt::Debug for Clients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clients").finish_non_exhaustive()
    }
}

/// The only mutable state of a run. Mutated exclusively by
/// [`Session::update`](super::controller).
#[derive(Debug)]
pub struct Session {
    pub(super) phase: Phase,
    pub(super) error: Option<WorkflowError>,
    pub(super) progress: Vec<ProgressEntry>,
    pub(super) workspaces: Vec<Workspace>,
    pub(super) source: Option<Workspace>,
    pub(super) branch_name: Option<String>,
    pub(super) workspace_name: Option<String>,
    pub(super) summary: Option<String>,
    pub(super) clients: Option<Clients>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Init,
            error: None,
            progress: Vec::new(),
            workspaces: Vec::new(),
            source: None,
            branch_name: None,
            workspace_name: None,
            summary: None,
            clients: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    pub fn progress(&self) -> &[ProgressEntry] {
        &self.progress
    }

    /// Workspaces offered for selection
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Selected parent workspace; carries its git link once fetched.
    pub fn source(&self) -> Option<&Workspace> {
        self.source.as_ref()
    }

    pub fn branch_name(&self) -> Option<&str> {
        self.branch_name.as_deref()
    }

    pub fn workspace_name(&self) -> Option<&str> {
        self.workspace_name.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn clients(&self) -> Option<&Clients> {
        self.clients.as_ref()
    }
}
