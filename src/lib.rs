//! Promptly: a prompt library client.
//!
//! The library crate holds everything except argument parsing and command
//! output:
//!
//! - [`template`]: placeholder detection, preview rendering, execution
//! - [`session`]: who is using the client and what they are looking at
//! - [`identity`]: account backends (device-local demo, hosted remote)
//! - [`generation`]: text generation with a deterministic fallback
//! - [`library`]: the on-disk prompt collection
//! - [`chat`]: assistant conversations
//!
//! The rest is plumbing shared by the CLI: configuration, device storage,
//! atomic file writes, activity events and logging.

pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod generation;
pub mod identity;
pub mod library;
pub mod logging;
pub mod persistence;
pub mod session;
pub mod template;
