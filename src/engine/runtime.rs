// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ArtifactPaths, ExitPolicy, RunConfig};
use crate::console::Console;
use crate::errors::Result;
use crate::exec::AgentBackend;
use crate::exit_codes;
use crate::fs::FileSystem;
use crate::report::{probe_marker, RunReport};

use super::core::CoreRuntime;
use super::{CoreCommand, ExitDecision, OutputStream, RunEvent, RunPhase};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub exit_code: i32,
    /// Whether the output file was written.
    pub log_saved: bool,
    /// Marker report, if the run got far enough to check.
    pub report: Option<RunReport>,
}

/// Drives the core state machine in response to `RunEvent`s and performs the
/// IO it asks for: talking to the agent, timers, console and files.
pub struct Runtime<B: AgentBackend> {
    core: CoreRuntime,
    event_tx: mpsc::Sender<RunEvent>,
    event_rx: mpsc::Receiver<RunEvent>,
    backend: B,
    fs: Arc<dyn FileSystem>,
    console: Box<dyn Console>,
    files: ArtifactPaths,
    exit_policy: ExitPolicy,
    warmup: Duration,
    timers: Vec<JoinHandle<()>>,
    log_saved: bool,
    report: Option<RunReport>,
}

impl<B: AgentBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl<B: AgentBackend> Runtime<B> {
    pub fn new(
        config: &RunConfig,
        backend: B,
        fs: Arc<dyn FileSystem>,
        console: Box<dyn Console>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            core: CoreRuntime::from_config(config),
            event_tx,
            event_rx,
            backend,
            fs,
            console,
            files: config.files.clone(),
            exit_policy: config.exit_policy,
            warmup: config.timing.warmup,
            timers: Vec::new(),
            log_saved: false,
            report: None,
        }
    }

    /// Sender for injecting events from outside (e.g. Ctrl-C).
    pub fn event_sender(&self) -> mpsc::Sender<RunEvent> {
        self.event_tx.clone()
    }

    /// Run to completion.
    ///
    /// The warm-up timer starts together with the agent. Events are then fed
    /// to the core one at a time until it asks to exit; the agent is shut
    /// down before returning.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(warmup_ms = self.warmup.as_millis() as u64, "agentexec runtime started");

        let begin = self.core.begin();
        for command in begin.commands {
            self.execute_command(command).await;
        }

        self.arm_timer(self.warmup, RunEvent::WarmupElapsed);

        let launched = self.backend.launch(self.event_tx.clone()).await;
        let mut exit_code = match launched {
            Ok(()) => None,
            Err(err) => {
                error!(error = %err, "failed to launch agent");
                self.process_event(RunEvent::SpawnFailed {
                    reason: err.to_string(),
                })
                .await
            }
        };

        while exit_code.is_none() {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    // We hold a sender ourselves, so this only happens if the
                    // runtime is torn down from outside.
                    warn!("runtime event channel closed; exiting");
                    exit_code = Some(exit_codes::FAILURE);
                    break;
                }
            };
            exit_code = self.process_event(event).await;
        }

        for timer in self.timers.drain(..) {
            timer.abort();
        }
        self.backend.shutdown().await;

        let exit_code = exit_code.unwrap_or(exit_codes::FAILURE);
        info!(exit_code, log_saved = self.log_saved, "runtime exiting");

        Ok(RunSummary {
            exit_code,
            log_saved: self.log_saved,
            report: self.report,
        })
    }

    /// Feed one event to the core and execute its commands. Returns the exit
    /// code once the core decides the run is over.
    async fn process_event(&mut self, event: RunEvent) -> Option<i32> {
        match &event {
            RunEvent::Output { stream, chunk } => {
                debug!(?stream, bytes = chunk.len(), "agent output");
            }
            other => debug!(event = ?other, phase = %self.core.phase(), "runtime received event"),
        }

        let step = self.core.step(event);

        let mut exit_code = None;
        for command in step.commands {
            if let Some(code) = self.execute_command(command).await {
                exit_code = Some(code);
            }
        }

        if !step.keep_running && exit_code.is_none() {
            // The core always ends with `Exit`; treat anything else as a bug.
            error!("core stopped without an exit decision");
            exit_code = Some(exit_codes::FAILURE);
        }
        exit_code
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Option<i32> {
        match command {
            CoreCommand::Mirror { stream, text } => match stream {
                OutputStream::Stdout => self.console.out(&text),
                OutputStream::Stderr => self.console.err(&text),
            },
            CoreCommand::Announce(line) => self.console.out_line(&line),
            CoreCommand::AnnounceError(line) => self.console.err_line(&line),
            CoreCommand::SendMessage(message) => self.send_message(message).await,
            CoreCommand::ArmResponseTimer(delay) => {
                self.arm_timer(delay, RunEvent::ResponseWindowElapsed);
            }
            CoreCommand::SaveLog(text) => self.save_log(&text),
            CoreCommand::ReportMarker => self.report_marker(),
            CoreCommand::Exit(decision) => return Some(self.resolve_exit(decision)),
        }
        None
    }

    async fn send_message(&mut self, message: String) {
        info!(bytes = message.len() + 1, "sending message to agent");
        if let Err(err) = self.backend.send_line(message).await {
            // The agent may already have closed stdin; keep waiting for its
            // response or exit regardless.
            warn!(error = %err, "failed to write message to agent stdin");
            self.console
                .err_line(&format!("[!] Failed to send message: {err}"));
        }
    }

    fn save_log(&mut self, text: &str) {
        let path = &self.files.output;
        match self.fs.write(path, text.as_bytes()) {
            Ok(()) => {
                info!(path = %path.display(), bytes = text.len(), "saved agent output");
                self.log_saved = true;
                self.console.out_line(&format!(
                    "[+] Terminal output saved to {}",
                    self.files.output_name
                ));
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to save agent output");
                self.console.err_line(&format!(
                    "[X] Failed to save {}: {err:#}",
                    self.files.output_name
                ));
            }
        }
    }

    fn report_marker(&mut self) {
        let status = probe_marker(self.fs.as_ref(), &self.files.marker);
        let report = RunReport::new(&self.files, status);
        info!(
            marker = %self.files.marker.display(),
            found = report.succeeded(),
            "marker check complete"
        );
        self.console.out(&report.to_string());
        self.report = Some(report);
    }

    fn resolve_exit(&self, decision: ExitDecision) -> i32 {
        match decision {
            ExitDecision::Code(code) => code,
            ExitDecision::FromMarker => {
                let found = self.report.as_ref().is_some_and(RunReport::succeeded);
                self.exit_policy.code_for(found)
            }
        }
    }

    fn arm_timer(&mut self, delay: Duration, event: RunEvent) {
        debug!(delay_ms = delay.as_millis() as u64, ?event, "arming timer");
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event).await;
        });
        self.timers.push(handle);
    }

    /// Phase of the underlying core (for tests and diagnostics).
    pub fn phase(&self) -> RunPhase {
        self.core.phase()
    }
}
