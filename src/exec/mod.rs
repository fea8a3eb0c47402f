// src/exec/mod.rs

//! Process execution layer.
//!
//! This module starts the agent with `tokio::process::Command`, writes the
//! message to its stdin, and reports its output and exit back to the
//! runtime as `RunEvent`s.
//!
//! - [`backend`] provides the `AgentBackend` trait and the concrete
//!   `ProcessBackend` used in production; tests replace it with a scripted
//!   fake.
//! - [`process`] builds the command, spawns the child and watches it.
//! - [`decode`] turns raw pipe reads into UTF-8 chunks.

pub mod backend;
pub mod decode;
pub mod process;

pub use backend::{AgentBackend, BackendFuture, ProcessBackend};
pub use decode::Utf8ChunkDecoder;
