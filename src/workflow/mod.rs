//! Provisioning workflow
//!
//! - `session`: the single mutable aggregate of a run and its phases
//! - `message`: what flows into the controller and what it asks for in return
//! - `controller`: the transition function
//! - `steps`: the ordered execution sequence
//! - `runtime`: runs requested tasks and feeds their results back

pub mod controller;
pub mod error;
pub mod message;
pub mod runtime;
pub mod session;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{StepFailure, WorkflowError};
pub use message::{Effect, Message, Task, TextField};
pub use runtime::{ConfigConnector, Connector, Runtime, RuntimeAction};
pub use session::{Clients, Phase, ProgressEntry, Session};
pub use steps::{ExecutionPlan, Step, SyncPolicy};
