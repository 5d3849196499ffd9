//! Task runtime
//!
//! Turns the controller's [`Effect`]s into tokio tasks and feeds their
//! results back as [`Message`]s on a single channel. At most one task is
//! in flight; the controller's phase order guarantees a new task is only
//! requested after the previous one reported back.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::error::WorkflowError;
use super::message::{Effect, Message, Task, TextField};
use super::session::{Clients, Session};
use super::steps::{self, SyncPolicy};
use crate::auth;
use crate::config::Config;
use crate::remote::{DevOpsClient, FabricClient};

/// Builds the authenticated facades for a session.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Clients, WorkflowError>;
}

/// Production connector: token provider and HTTP clients from [`Config`].
pub struct ConfigConnector {
    config: Config,
}

impl ConfigConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for ConfigConnector {
    async fn connect(&self) -> Result<Clients, WorkflowError> {
        let tokens = auth::provider_from_config(&self.config.auth).map_err(init_error)?;
        let timeout = self.config.http.timeout();
        let platform =
            FabricClient::new(&self.config.fabric, tokens.clone(), timeout).map_err(init_error)?;
        let repos = DevOpsClient::new(&self.config.devops, tokens, timeout).map_err(init_error)?;

        info!(
            fabric = %self.config.fabric.base_url,
            devops = %self.config.devops.base_url,
            "Clients initialized"
        );
        Ok(Clients {
            platform: Arc::new(platform),
            repos: Arc::new(repos),
        })
    }
}

fn init_error(e: impl std::fmt::Display) -> WorkflowError {
    WorkflowError::Init(e.to_string())
}

/// What the presentation loop should do after an effect was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAction {
    Continue,
    Prefill { field: TextField, value: String },
    Quit,
}

struct InFlight {
    task: &'static str,
    handle: JoinHandle<()>,
}

pub struct Runtime {
    connector: Arc<dyn Connector>,
    policy: SyncPolicy,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    in_flight: Option<InFlight>,
}

impl Runtime {
    pub fn new(connector: Arc<dyn Connector>, policy: SyncPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            connector,
            policy,
            tx,
            rx,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Next task result. Cancel safe.
    pub async fn recv(&mut self) -> Option<Message> {
        let message = self.rx.recv().await?;
        if message.ends_task() {
            self.in_flight = None;
        }
        Some(message)
    }

    pub fn apply(&mut self, session: &Session, effect: Effect) -> RuntimeAction {
        match effect {
            Effect::None => RuntimeAction::Continue,
            Effect::Dispatch(task) => {
                self.dispatch(session, task);
                RuntimeAction::Continue
            }
            Effect::Prefill { field, value } => RuntimeAction::Prefill { field, value },
            Effect::Quit => RuntimeAction::Quit,
        }
    }

    fn dispatch(&mut self, session: &Session, task: Task) {
        if let Some(current) = &self.in_flight {
            error!(
                task = task.name(),
                in_flight = current.task,
                "Task requested while another is in flight; dropped"
            );
            return;
        }

        info!(task = task.name(), "Dispatching task");
        let name = task.name();
        let handle = tokio::spawn(run_task(
            task,
            self.connector.clone(),
            session.clients().cloned(),
            self.policy,
            self.tx.clone(),
        ));
        self.in_flight = Some(InFlight { task: name, handle });
    }

    /// Abort the outstanding task, if any. Remote side effects already made stay.
    pub fn shutdown(&mut self) {
        if let Some(current) = self.in_flight.take() {
            info!(task = current.task, "Aborting in-flight task");
            current.handle.abort();
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_task(
    task: Task,
    connector: Arc<dyn Connector>,
    clients: Option<Clients>,
    policy: SyncPolicy,
    tx: mpsc::UnboundedSender<Message>,
) {
    let message = match (task, clients) {
        (Task::InitClients, _) => match connector.connect().await {
            Ok(clients) => Message::ClientsReady(clients),
            Err(e) => Message::Failed(e),
        },
        (_, None) => Message::Failed(WorkflowError::Init(
            "clients are not initialized".to_string(),
        )),
        (Task::ListWorkspaces, Some(clients)) => match clients.platform.list_workspaces().await {
            Ok(workspaces) => Message::WorkspacesLoaded(workspaces),
            Err(cause) => Message::Failed(WorkflowError::Fetch {
                what: "list workspaces",
                cause,
            }),
        },
        (Task::FetchGitLink { workspace_id }, Some(clients)) => {
            match clients.platform.get_git_connection(&workspace_id).await {
                Ok(link) => Message::GitLinkLoaded(link),
                Err(cause) => Message::Failed(WorkflowError::Fetch {
                    what: "get git connection",
                    cause,
                }),
            }
        }
        (Task::Execute(plan), Some(clients)) => {
            let progress = tx.clone();
            let result = steps::execute(&plan, &clients, &policy, |entry| {
                let _ = progress.send(Message::StepCompleted(entry));
            })
            .await;
            match result {
                Ok(summary) => Message::SequenceSucceeded(summary),
                Err(failure) => Message::SequenceFailed(failure),
            }
        }
    };

    // Receiver is gone once the presentation loop exited.
    let _ = tx.send(message);
}
