//! Request routing
//!
//! Two independent, pure decisions made for every inbound request:
//! - [`classifier`]: which skill should handle it
//! - [`tier`]: how much model depth it deserves

pub mod classifier;
pub mod tier;

pub use classifier::{Classification, SkillTable, GENERAL_SKILL};
pub use tier::{TierSelection, TierSelector};
