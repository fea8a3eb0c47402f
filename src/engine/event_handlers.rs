// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::Duration;

use tracing::debug;

use crate::engine::core::{CoreSettings, RunState};
use crate::engine::{OutputStream, RunPhase};
use crate::exit_codes;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Copy an agent chunk to the orchestrator's own stream, unchanged.
    Mirror { stream: OutputStream, text: String },
    /// Status line on stdout.
    Announce(String),
    /// Status line on stderr.
    AnnounceError(String),
    /// Write this line plus a newline to the agent's stdin.
    SendMessage(String),
    /// Emit `ResponseWindowElapsed` after the given delay.
    ArmResponseTimer(Duration),
    /// Overwrite the output file with this text.
    SaveLog(String),
    /// Probe the marker file and print the report.
    ReportMarker,
    /// Stop the run.
    Exit(ExitDecision),
}

/// How the shell should pick the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Code(i32),
    /// Apply the configured exit policy to the marker report.
    FromMarker,
}

/// Decision returned by the core after handling a single `RunEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn finish_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: false,
        }
    }

    fn ignored() -> Self {
        Self::continue_with(Vec::new())
    }
}

/// Handle an output chunk.
///
/// Chunks are recorded and mirrored in every phase. While the message is
/// still pending, the raw output is also checked against the ready pattern.
pub fn handle_output(
    state: &mut RunState,
    settings: &CoreSettings,
    stream: OutputStream,
    chunk: String,
) -> CoreStep {
    match stream {
        OutputStream::Stdout => state.log.append_stdout(&chunk),
        OutputStream::Stderr => state.log.append_stderr(&chunk),
    }

    let mut commands = Vec::new();
    let ready = state.phase == RunPhase::Running
        && settings.ready_pattern.as_ref().is_some_and(|re| {
            state.ready_scan.push_str(&chunk);
            re.is_match(&state.ready_scan)
        });

    commands.push(CoreCommand::Mirror {
        stream,
        text: chunk,
    });

    if ready {
        debug!("agent output matched ready pattern");
        commands.extend(send_message(state, settings));
    }

    CoreStep::continue_with(commands)
}

/// Handle the warm-up deadline: send the message unless that already
/// happened because the ready pattern matched.
pub fn handle_warmup(state: &mut RunState, settings: &CoreSettings) -> CoreStep {
    if state.phase != RunPhase::Running {
        debug!(phase = %state.phase, "warm-up elapsed after message was sent; ignoring");
        return CoreStep::ignored();
    }
    CoreStep::continue_with(send_message(state, settings))
}

/// Handle the end of the response window: save, report, exit.
pub fn handle_response_window(state: &mut RunState) -> CoreStep {
    if state.phase != RunPhase::MessageSent {
        debug!(phase = %state.phase, "response window elapsed in unexpected phase; ignoring");
        return CoreStep::ignored();
    }

    state.phase = RunPhase::Saving;
    let commands = vec![
        CoreCommand::SaveLog(state.log.as_str().to_string()),
        CoreCommand::ReportMarker,
        CoreCommand::Exit(ExitDecision::FromMarker),
    ];
    state.phase = RunPhase::Done;

    CoreStep::finish_with(commands)
}

/// Handle the agent exiting before the run finished.
///
/// The log is still saved and the marker still reported, but the run ends
/// with the agent's own exit code.
pub fn handle_agent_exit(state: &mut RunState, code: Option<i32>) -> CoreStep {
    if state.phase >= RunPhase::Saving {
        debug!(phase = %state.phase, ?code, "agent exit after saving started; ignoring");
        return CoreStep::ignored();
    }

    let shown = match code {
        Some(c) => c.to_string(),
        None => "none (terminated by signal)".to_string(),
    };

    state.phase = RunPhase::Saving;
    let commands = vec![
        CoreCommand::Announce(format!("\n[i] Agent exited with code {shown}")),
        CoreCommand::SaveLog(state.log.as_str().to_string()),
        CoreCommand::ReportMarker,
        CoreCommand::Exit(ExitDecision::Code(code.unwrap_or(exit_codes::FAILURE))),
    ];
    state.phase = RunPhase::Done;

    CoreStep::finish_with(commands)
}

/// Handle a spawn failure. Nothing is saved: there is no output to save.
pub fn handle_spawn_failure(state: &mut RunState, reason: &str) -> CoreStep {
    if state.phase == RunPhase::Done {
        return CoreStep::ignored();
    }

    state.phase = RunPhase::Done;
    CoreStep::finish_with(vec![
        CoreCommand::AnnounceError(format!("[X] Error spawning agent: {reason}")),
        CoreCommand::Exit(ExitDecision::Code(exit_codes::FAILURE)),
    ])
}

/// Handle Ctrl-C: keep whatever output was captured, then stop.
pub fn handle_interrupt(state: &mut RunState) -> CoreStep {
    if state.phase >= RunPhase::Saving {
        return CoreStep::ignored();
    }

    state.phase = RunPhase::Saving;
    let commands = vec![
        CoreCommand::AnnounceError("\n[!] Interrupted; saving captured output".to_string()),
        CoreCommand::SaveLog(state.log.as_str().to_string()),
        CoreCommand::Exit(ExitDecision::Code(exit_codes::INTERRUPTED)),
    ];
    state.phase = RunPhase::Done;

    CoreStep::finish_with(commands)
}

fn send_message(state: &mut RunState, settings: &CoreSettings) -> Vec<CoreCommand> {
    state.phase = RunPhase::MessageSent;
    state.ready_scan.clear();

    vec![
        CoreCommand::Announce("[*] Sending initial message...".to_string()),
        CoreCommand::SendMessage(settings.message.clone()),
        CoreCommand::Announce("[+] Message sent!".to_string()),
        CoreCommand::Announce(format!(
            "[*] Waiting {} for agent response...",
            describe_wait(settings.response_wait)
        )),
        CoreCommand::ArmResponseTimer(settings.response_wait),
    ]
}

/// "12 seconds", "1 second", "750ms".
pub fn describe_wait(d: Duration) -> String {
    if d.subsec_millis() == 0 && d.as_secs() > 0 {
        let secs = d.as_secs();
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        }
    } else {
        format!("{}ms", d.as_millis())
    }
}
