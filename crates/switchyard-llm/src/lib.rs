//! Switchyard LLM - Model Backend Abstraction
//!
//! This crate provides model-backend integration for Switchyard:
//! - Tier: execution tiers (fast, deep, premium) and their model mapping
//! - Backend: the `ModelBackend` trait and the Messages API HTTP client
//! - Error: backend failures classified as unavailable, timed out or rejected
//! - Mock: a scripted backend for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod message;
pub mod messages_api;
pub mod mock;
pub mod tier;
pub mod util;

pub use backend::{ModelBackend, ModelRequest, ModelResponse};
pub use error::{Error, ErrorKind, Result};
pub use message::{Message, MessageRole};
pub use messages_api::{BackendConfig, MessagesApiClient};
pub use mock::MockBackend;
pub use tier::{ModelTier, TierModels, TierTimeouts};
