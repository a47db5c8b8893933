//! Orchestrator - Request pipeline
//!
//! Ties routing, dispatch, sessions and the message stores together.
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig` and `OrchestratorInput`
//! - `core`: `Orchestrator` struct and accessors
//! - `process`: inbound message pipeline
//! - `commands`: session commands and prompt follow-ups

mod commands;
mod config;
mod core;
mod process;

#[cfg(test)]
mod tests;

pub use self::config::{OrchestratorConfig, OrchestratorInput};
pub use self::core::Orchestrator;
pub use self::process::MessageOutcome;
