//! Switchyard Channels - Transports
//!
//! This crate provides the chat-facing edge of Switchyard:
//! - Message: normalized inbound events (messages and reactions)
//! - Console: a stdin/stdout transport for local use

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod console;
pub mod error;
pub mod message;

pub use error::{Error, Result};

pub use console::ConsoleTransport;
pub use message::{parse_console_line, ChannelType, InboundEvent, NormalizedMessage};
