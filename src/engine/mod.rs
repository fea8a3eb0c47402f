// src/engine/mod.rs

//! Orchestration engine for agentexec.
//!
//! A run reacts to:
//! - output chunks from the agent's stdout and stderr
//! - the warm-up and response-window timers
//! - the agent exiting or failing to start
//! - Ctrl-C
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

/// Which of the agent's output streams a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Lifecycle of a single run.
///
/// Phases only move forward: `Running → MessageSent → Saving → Done`. A run
/// that ends early (agent exit, spawn failure, Ctrl-C) may skip phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Agent started; message not yet sent.
    Running,
    /// Message sent; waiting for the response window to elapse.
    MessageSent,
    /// Output is being saved and the marker checked.
    Saving,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Running => "running",
            RunPhase::MessageSent => "message-sent",
            RunPhase::Saving => "saving",
            RunPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Events flowing into the runtime from the agent backend, timers and
/// signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A chunk of decoded agent output.
    Output { stream: OutputStream, chunk: String },
    /// The warm-up deadline passed.
    WarmupElapsed,
    /// The response window after sending the message passed.
    ResponseWindowElapsed,
    /// The agent exited and its output streams are drained. `None` when the
    /// process was terminated by a signal.
    AgentExited { code: Option<i32> },
    /// The agent process could not be started.
    SpawnFailed { reason: String },
    /// Ctrl-C.
    Interrupted,
}

impl RunEvent {
    pub fn stdout(chunk: impl Into<String>) -> Self {
        RunEvent::Output {
            stream: OutputStream::Stdout,
            chunk: chunk.into(),
        }
    }

    pub fn stderr(chunk: impl Into<String>) -> Self {
        RunEvent::Output {
            stream: OutputStream::Stderr,
            chunk: chunk.into(),
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep, ExitDecision};
pub use runtime::{RunSummary, Runtime};
