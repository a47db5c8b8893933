//! Server module for Switchyard
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `background_tasks`: Store sweeps and session autosave
//! - `init`: Orchestrator construction and the console run loop

mod background_tasks;
pub mod config;
mod init;
mod loader;

pub use init::run;
pub use loader::load_config;
