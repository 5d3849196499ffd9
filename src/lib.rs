//! Fabricant - feature branch + feature workspace provisioning for Fabric and Azure DevOps
//!
//! The interesting part lives in [`workflow`]: a phase machine that owns the
//! session, decides which remote call runs next and turns every result into
//! a transition. [`remote`] holds the two REST facades, [`tui`] the terminal
//! front end.

pub mod auth;
pub mod config;
pub mod remote;
pub mod tui;
pub mod util;
pub mod workflow;
