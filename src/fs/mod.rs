//! Filesystem utilities for promptly.
//!
//! Local state (device store, prompt library) is only ever written through
//! these helpers so that an interrupted write cannot corrupt it.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_file, remove_if_exists};
