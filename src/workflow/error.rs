use thiserror::Error;

use super::steps::Step;
use crate::remote::RemoteError;

/// Why a session ended up in `Phase::Error`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Failed to initialize clients: {0}")]
    Init(String),

    #[error("Failed to {what}: {cause}")]
    Fetch {
        what: &'static str,
        cause: RemoteError,
    },

    #[error("Workspace '{workspace}' does not have git integration (or unsupported provider)")]
    UnsupportedGitIntegration { workspace: String },

    #[error("{step} failed: {cause}")]
    Step { step: Step, cause: RemoteError },
}

impl WorkflowError {
    /// Failing execution step, if the error came from the sequence
    pub fn step(&self) -> Option<Step> {
        match self {
            WorkflowError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// First failing step of an execution sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{step} failed: {cause}")]
pub struct StepFailure {
    pub step: Step,
    pub cause: RemoteError,
}

impl From<StepFailure> for WorkflowError {
    fn from(failure: StepFailure) -> Self {
        WorkflowError::Step {
            step: failure.step,
            cause: failure.cause,
        }
    }
}
