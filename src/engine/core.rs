// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RunEvent`]s and produces:
//! - an updated core state (phase + output log)
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the channel
//! - writing to the agent's stdin and to the console
//! - timers, files and process shutdown
//!
//! Because every event goes through [`CoreRuntime::step`] one at a time, the
//! agent-exit event and the timers can no longer race: whichever arrives
//! first decides, and once saving has started later events are ignored.

use std::time::Duration;

use regex::Regex;

use crate::config::RunConfig;
use crate::engine::event_handlers::{
    handle_agent_exit, handle_interrupt, handle_output, handle_response_window,
    handle_spawn_failure, handle_warmup, CoreCommand, CoreStep,
};
use crate::engine::{RunEvent, RunPhase};
use crate::output_log::OutputLog;

/// Immutable per-run settings the handlers need.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub message: String,
    pub agent_args: Vec<String>,
    pub response_wait: Duration,
    pub ready_pattern: Option<Regex>,
}

impl CoreSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            message: config.message.clone(),
            agent_args: config.agent.args.clone(),
            response_wait: config.timing.response_wait,
            ready_pattern: config.timing.ready_pattern.clone(),
        }
    }
}

/// Mutable state of one run.
#[derive(Debug, Clone)]
pub struct RunState {
    pub phase: RunPhase,
    pub log: OutputLog,
    /// Raw agent output seen while waiting for the ready pattern.
    pub ready_scan: String,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: RunPhase::Running,
            log: OutputLog::new(),
            ready_scan: String::new(),
        }
    }
}

/// Pure core runtime.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    settings: CoreSettings,
    state: RunState,
}

impl CoreRuntime {
    pub fn new(settings: CoreSettings) -> Self {
        Self {
            settings,
            state: RunState::default(),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(CoreSettings::from_config(config))
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn log(&self) -> &OutputLog {
        &self.state.log
    }

    /// Commands to run before any event arrives (the start-up banner).
    pub fn begin(&self) -> CoreStep {
        let commands = vec![
            CoreCommand::Announce("[*] Starting agent with initial message...".to_string()),
            CoreCommand::Announce(format!("    Message: \"{}\"", self.settings.message)),
            CoreCommand::Announce(format!("    Args: {}", self.settings.agent_args.join(" "))),
            CoreCommand::Announce(String::new()),
        ];
        CoreStep {
            commands,
            keep_running: true,
        }
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RunEvent) -> CoreStep {
        let state = &mut self.state;
        let settings = &self.settings;

        match event {
            RunEvent::Output { stream, chunk } => handle_output(state, settings, stream, chunk),
            RunEvent::WarmupElapsed => handle_warmup(state, settings),
            RunEvent::ResponseWindowElapsed => handle_response_window(state),
            RunEvent::AgentExited { code } => handle_agent_exit(state, code),
            RunEvent::SpawnFailed { reason } => handle_spawn_failure(state, &reason),
            RunEvent::Interrupted => handle_interrupt(state),
        }
    }
}
