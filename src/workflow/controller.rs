//! The transition function
//!
//! [`Session::update`] is the only code that mutates a session. It never
//! performs I/O: remote work is requested by returning an [`Effect`] and its
//! result comes back later as another [`Message`].

use tracing::{debug, info, warn};

use super::error::WorkflowError;
use super::message::{Effect, Message, Task, TextField};
use super::session::{Clients, Phase, Session};
use super::steps::ExecutionPlan;
use crate::remote::{GitLinkDescriptor, Workspace};

pub const WORKSPACE_NAME_PREFIX: &str = "Feature - ";

/// Name pre-filled once a branch name is confirmed
pub fn default_workspace_name(branch: &str) -> String {
    format!("{}{}", WORKSPACE_NAME_PREFIX, branch)
}

impl Session {
    /// First effect of a fresh session.
    pub fn start(&self) -> Effect {
        if self.phase == Phase::Init && self.clients.is_none() {
            Effect::Dispatch(Task::InitClients)
        } else {
            Effect::None
        }
    }

    pub fn update(&mut self, message: Message) -> Effect {
        let from = self.phase;
        let effect = self.transition(message);
        if self.phase != from {
            info!(from = %from, to = %self.phase, "Phase changed");
        }
        effect
    }

    fn transition(&mut self, message: Message) -> Effect {
        match (self.phase, message) {
            (_, Message::Abort) => Effect::Quit,
            (_, Message::Resize { .. }) => Effect::None,

            (Phase::Init, Message::ClientsReady(clients)) => self.attach_clients(clients),
            (phase, Message::Failed(error)) if !phase.is_terminal() => self.fail(error),

            (Phase::LoadingWorkspaces, Message::WorkspacesLoaded(workspaces)) => {
                debug!(count = workspaces.len(), "Workspaces loaded");
                self.workspaces = workspaces;
                self.phase = Phase::SelectWorkspace;
                Effect::None
            }

            (Phase::SelectWorkspace, Message::SelectionConfirmed(Some(index))) => {
                match self.workspaces.get(index).cloned() {
                    Some(workspace) => self.select(workspace),
                    None => {
                        debug!(index, "Selection out of range");
                        Effect::None
                    }
                }
            }

            (Phase::LoadingGitLink, Message::GitLinkLoaded(link)) => self.attach_git_link(link),

            (
                Phase::EnterBranchName,
                Message::TextConfirmed {
                    field: TextField::BranchName,
                    value,
                },
            ) => self.confirm_branch_name(&value),

            (
                Phase::EnterWorkspaceName,
                Message::TextConfirmed {
                    field: TextField::WorkspaceName,
                    value,
                },
            ) => self.confirm_workspace_name(&value),

            (Phase::Executing, Message::StepCompleted(entry)) => {
                self.progress.push(entry);
                Effect::None
            }
            (Phase::Executing, Message::SequenceFailed(failure)) => self.fail(failure.into()),
            (Phase::Executing, Message::SequenceSucceeded(summary)) => {
                self.summary = Some(summary);
                self.phase = Phase::Done;
                Effect::Quit
            }

            (phase, message) => {
                debug!(phase = %phase, message = message.name(), "Message ignored");
                Effect::None
            }
        }
    }

    fn attach_clients(&mut self, clients: Clients) -> Effect {
        self.clients = Some(clients);
        self.phase = Phase::LoadingWorkspaces;
        Effect::Dispatch(Task::ListWorkspaces)
    }

    fn select(&mut self, workspace: Workspace) -> Effect {
        let workspace_id = workspace.id.clone();
        info!(id = %workspace_id, name = %workspace.display_name, "Parent workspace selected");
        self.source = Some(workspace);
        self.phase = Phase::LoadingGitLink;
        Effect::Dispatch(Task::FetchGitLink { workspace_id })
    }

    fn attach_git_link(&mut self, link: Option<GitLinkDescriptor>) -> Effect {
        let Some(source) = self.source.as_ref() else {
            return self.fail(WorkflowError::Init("no workspace selected".to_string()));
        };

        match link.filter(GitLinkDescriptor::is_usable) {
            Some(link) => {
                let source = source.with_git_link(link);
                self.source = Some(source);
                self.phase = Phase::EnterBranchName;
                Effect::None
            }
            None => {
                let workspace = source.display_name.clone();
                self.fail(WorkflowError::UnsupportedGitIntegration { workspace })
            }
        }
    }

    fn confirm_branch_name(&mut self, value: &str) -> Effect {
        let branch = value.trim();
        if branch.is_empty() {
            return Effect::None;
        }

        let prefill = default_workspace_name(branch);
        self.branch_name = Some(branch.to_string());
        self.phase = Phase::EnterWorkspaceName;
        Effect::Prefill {
            field: TextField::WorkspaceName,
            value: prefill,
        }
    }

    fn confirm_workspace_name(&mut self, value: &str) -> Effect {
        let name = value.trim();
        if name.is_empty() {
            return Effect::None;
        }

        let plan = match (&self.source, &self.branch_name) {
            (Some(parent), Some(branch)) => {
                parent.git_link.clone().map(|source_link| ExecutionPlan {
                    parent: parent.clone(),
                    source_link,
                    branch_name: branch.clone(),
                    workspace_name: name.to_string(),
                })
            }
            _ => None,
        };
        let Some(plan) = plan else {
            warn!("Workspace name confirmed without a source link or branch");
            return Effect::None;
        };

        self.workspace_name = Some(name.to_string());
        self.phase = Phase::Executing;
        Effect::Dispatch(Task::Execute(plan))
    }

    fn fail(&mut self, error: WorkflowError) -> Effect {
        warn!(phase = %self.phase, error = %error, "Workflow failed");
        self.error = Some(error);
        self.phase = Phase::Error;
        Effect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::workflow::error::StepFailure;
    use crate::workflow::session::ProgressEntry;
    use crate::workflow::steps::Step;
    use crate::workflow::testing::{sample_link, sample_workspace, FakeBackend};
    use std::sync::Arc;

    fn clients() -> Clients {
        Arc::new(FakeBackend::new()).clients()
    }

    fn branch(value: &str) -> Message {
        Message::TextConfirmed {
            field: TextField::BranchName,
            value: value.to_string(),
        }
    }

    fn workspace_name(value: &str) -> Message {
        Message::TextConfirmed {
            field: TextField::WorkspaceName,
            value: value.to_string(),
        }
    }

    fn fetch_error() -> WorkflowError {
        WorkflowError::Fetch {
            what: "list workspaces",
            cause: RemoteError::Status {
                service: "fabric",
                status: 401,
                body: "unauthorized".into(),
            },
        }
    }

    /// Session driven up to `phase` along the happy path
    fn session_at(phase: Phase) -> Session {
        let mut session = Session::new();
        let script = [
            Message::ClientsReady(clients()),
            Message::WorkspacesLoaded(vec![
                sample_workspace("ws-dev", "Dev"),
                sample_workspace("ws-test", "Test"),
            ]),
            Message::SelectionConfirmed(Some(0)),
            Message::GitLinkLoaded(Some(sample_link())),
            branch("feature/login"),
            workspace_name("Feature - feature/login"),
        ];
        for message in script {
            if session.phase() == phase {
                break;
            }
            session.update(message);
        }
        assert_eq!(session.phase(), phase);
        session
    }

    #[test]
    fn test_start_requests_clients() {
        let session = Session::new();
        assert!(matches!(session.start(), Effect::Dispatch(Task::InitClients)));
        assert!(matches!(session_at(Phase::LoadingWorkspaces).start(), Effect::None));
    }

    #[test]
    fn test_clients_ready_lists_workspaces() {
        let mut session = Session::new();
        let effect = session.update(Message::ClientsReady(clients()));
        assert!(matches!(effect, Effect::Dispatch(Task::ListWorkspaces)));
        assert_eq!(session.phase(), Phase::LoadingWorkspaces);
        assert!(session.clients().is_some());
    }

    #[test]
    fn test_init_failure() {
        let mut session = Session::new();
        session.update(Message::Failed(WorkflowError::Init("az not found".into())));
        assert_eq!(session.phase(), Phase::Error);
        assert!(session.error().unwrap().to_string().contains("az not found"));
    }

    #[test]
    fn test_list_failure_leaves_no_workspaces() {
        let mut session = session_at(Phase::LoadingWorkspaces);
        session.update(Message::Failed(fetch_error()));
        assert_eq!(session.phase(), Phase::Error);
        assert!(session.workspaces().is_empty());
        assert!(session
            .error()
            .unwrap()
            .to_string()
            .starts_with("Failed to list workspaces"));
    }

    #[test]
    fn test_selection_fetches_git_link() {
        let mut session = session_at(Phase::SelectWorkspace);
        let effect = session.update(Message::SelectionConfirmed(Some(1)));
        match effect {
            Effect::Dispatch(Task::FetchGitLink { workspace_id }) => {
                assert_eq!(workspace_id, "ws-test")
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(session.phase(), Phase::LoadingGitLink);
        assert_eq!(session.source().unwrap().display_name, "Test");
    }

    #[test]
    fn test_selection_without_item_is_ignored() {
        let mut session = session_at(Phase::SelectWorkspace);
        assert!(matches!(
            session.update(Message::SelectionConfirmed(None)),
            Effect::None
        ));
        assert!(matches!(
            session.update(Message::SelectionConfirmed(Some(9))),
            Effect::None
        ));
        assert_eq!(session.phase(), Phase::SelectWorkspace);
        assert!(session.source().is_none());
    }

    #[test]
    fn test_empty_workspace_list_stays_selectable() {
        let mut session = session_at(Phase::LoadingWorkspaces);
        session.update(Message::WorkspacesLoaded(Vec::new()));
        assert_eq!(session.phase(), Phase::SelectWorkspace);
        session.update(Message::SelectionConfirmed(Some(0)));
        assert_eq!(session.phase(), Phase::SelectWorkspace);
    }

    #[test]
    fn test_git_link_is_attached_to_source() {
        let session = session_at(Phase::EnterBranchName);
        let link = session.source().unwrap().git_link.as_ref().unwrap();
        assert_eq!(link.repository_path(), "A/P/R");
        assert_eq!(link.branch_name, "main");
    }

    #[test]
    fn test_missing_git_link_is_unsupported() {
        let mut session = session_at(Phase::LoadingGitLink);
        session.update(Message::GitLinkLoaded(None));
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(
            session.error(),
            Some(&WorkflowError::UnsupportedGitIntegration {
                workspace: "Dev".into()
            })
        );
    }

    #[test]
    fn test_empty_provider_type_is_unsupported() {
        let mut session = session_at(Phase::LoadingGitLink);
        let link = GitLinkDescriptor {
            git_provider_type: "  ".into(),
            ..sample_link()
        };
        session.update(Message::GitLinkLoaded(Some(link)));
        assert_eq!(session.phase(), Phase::Error);
        assert!(session.error().unwrap().to_string().contains("'Dev'"));
    }

    #[test]
    fn test_git_link_failure() {
        let mut session = session_at(Phase::LoadingGitLink);
        session.update(Message::Failed(WorkflowError::Fetch {
            what: "get git connection",
            cause: RemoteError::Transport {
                service: "fabric",
                message: "connection reset".into(),
            },
        }));
        assert_eq!(session.phase(), Phase::Error);
    }

    #[test]
    fn test_blank_branch_name_is_rejected() {
        let mut session = session_at(Phase::EnterBranchName);
        assert!(matches!(session.update(branch("   ")), Effect::None));
        assert!(matches!(session.update(branch("")), Effect::None));
        assert_eq!(session.phase(), Phase::EnterBranchName);
        assert!(session.branch_name().is_none());
    }

    #[test]
    fn test_branch_name_prefills_workspace_name() {
        let mut session = session_at(Phase::EnterBranchName);
        let effect = session.update(branch("  feature/x "));
        match effect {
            Effect::Prefill { field, value } => {
                assert_eq!(field, TextField::WorkspaceName);
                assert_eq!(value, "Feature - feature/x");
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(session.branch_name(), Some("feature/x"));
        assert_eq!(session.phase(), Phase::EnterWorkspaceName);
    }

    #[test]
    fn test_stale_confirmation_from_other_field_is_ignored() {
        let mut session = session_at(Phase::EnterBranchName);
        session.update(workspace_name("nope"));
        assert_eq!(session.phase(), Phase::EnterBranchName);

        let mut session = session_at(Phase::EnterWorkspaceName);
        session.update(branch("feature/other"));
        assert_eq!(session.phase(), Phase::EnterWorkspaceName);
        assert_eq!(session.branch_name(), Some("feature/login"));
    }

    #[test]
    fn test_blank_workspace_name_is_rejected() {
        let mut session = session_at(Phase::EnterWorkspaceName);
        assert!(matches!(session.update(workspace_name(" \t")), Effect::None));
        assert_eq!(session.phase(), Phase::EnterWorkspaceName);
    }

    #[test]
    fn test_workspace_name_dispatches_execution() {
        let mut session = session_at(Phase::EnterWorkspaceName);
        let effect = session.update(workspace_name(" My WS "));
        let plan = match effect {
            Effect::Dispatch(Task::Execute(plan)) => plan,
            other => panic!("unexpected effect {:?}", other),
        };
        assert_eq!(session.phase(), Phase::Executing);
        assert_eq!(session.workspace_name(), Some("My WS"));
        assert_eq!(plan.workspace_name, "My WS");
        assert_eq!(plan.branch_name, "feature/login");
        assert_eq!(plan.parent.id, "ws-dev");
        assert_eq!(plan.source_link, sample_link());
    }

    #[test]
    fn test_progress_and_success() {
        let mut session = session_at(Phase::Executing);
        for step in Step::ALL {
            session.update(Message::StepCompleted(ProgressEntry {
                step,
                message: step.label().to_string(),
            }));
        }
        assert_eq!(session.progress().len(), 5);

        let effect = session.update(Message::SequenceSucceeded("all good".into()));
        assert!(matches!(effect, Effect::Quit));
        assert_eq!(session.phase(), Phase::Done);
        assert_eq!(session.summary(), Some("all good"));
    }

    #[test]
    fn test_step_failure_records_step() {
        let mut session = session_at(Phase::Executing);
        session.update(Message::StepCompleted(ProgressEntry {
            step: Step::ResolveBaseCommit,
            message: "resolved".into(),
        }));
        session.update(Message::SequenceFailed(StepFailure {
            step: Step::CreateBranch,
            cause: RemoteError::Rejected {
                service: "devops",
                message: "branch exists".into(),
            },
        }));

        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.progress().len(), 1);
        assert_eq!(session.error().unwrap().step(), Some(Step::CreateBranch));
        assert!(session
            .error()
            .unwrap()
            .to_string()
            .starts_with("creating branch failed"));
    }

    #[test]
    fn test_error_is_absorbing() {
        let mut session = session_at(Phase::LoadingWorkspaces);
        session.update(Message::Failed(fetch_error()));
        let error = session.error().cloned();

        session.update(Message::WorkspacesLoaded(vec![sample_workspace("x", "X")]));
        session.update(Message::Failed(WorkflowError::Init("later".into())));
        session.update(Message::SequenceSucceeded("late".into()));

        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.error().cloned(), error);
        assert!(session.workspaces().is_empty());
        assert!(matches!(session.update(Message::Abort), Effect::Quit));
    }

    #[test]
    fn test_done_ignores_failures() {
        let mut session = session_at(Phase::Executing);
        session.update(Message::SequenceSucceeded("ok".into()));
        session.update(Message::Failed(fetch_error()));
        assert_eq!(session.phase(), Phase::Done);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_abort_and_resize_in_any_phase() {
        for phase in [
            Phase::Init,
            Phase::SelectWorkspace,
            Phase::EnterBranchName,
            Phase::Executing,
        ] {
            let mut session = session_at(phase);
            assert!(matches!(
                session.update(Message::Resize {
                    width: 80,
                    height: 24
                }),
                Effect::None
            ));
            assert_eq!(session.phase(), phase);
            assert!(matches!(session.update(Message::Abort), Effect::Quit));
        }
    }

    #[test]
    fn test_out_of_phase_messages_are_ignored() {
        let mut session = session_at(Phase::SelectWorkspace);
        session.update(Message::GitLinkLoaded(Some(sample_link())));
        session.update(Message::StepCompleted(ProgressEntry {
            step: Step::CreateBranch,
            message: "x".into(),
        }));
        session.update(Message::ClientsReady(clients()));
        assert_eq!(session.phase(), Phase::SelectWorkspace);
        assert!(session.progress().is_empty());
    }

    #[test]
    fn test_default_workspace_name() {
        assert_eq!(default_workspace_name("feature/x"), "Feature - feature/x");
    }
}
