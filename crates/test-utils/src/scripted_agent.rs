use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use agentexec::engine::RunEvent;
use agentexec::errors::{AgentExecError, Result};
use agentexec::exec::{AgentBackend, BackendFuture};
use agentexec::fs::mock::MockFileSystem;

/// A line the scripted agent received, and when (relative to launch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedLine {
    /// Bytes as written, including the trailing newline.
    pub text: String,
    pub after_launch: Duration,
}

/// Shared view of what happened to a [`ScriptedAgent`] after the runtime
/// has taken ownership of it.
#[derive(Debug, Clone, Default)]
pub struct AgentProbe {
    received: Arc<Mutex<Vec<ReceivedLine>>>,
    launched: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
}

impl AgentProbe {
    pub fn received(&self) -> Vec<ReceivedLine> {
        self.received.lock().unwrap().clone()
    }

    pub fn was_launched(&self) -> bool {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct MarkerAction {
    fs: MockFileSystem,
    path: PathBuf,
    content: String,
}

/// A fake agent that:
/// - emits scripted events at fixed offsets after launch
/// - emits scripted events at fixed offsets after receiving a line
/// - optionally writes a marker file when it receives a line
///
/// Events with the same offset are sent in the order they were added.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    spawn_error: Option<String>,
    reject_stdin: bool,
    on_launch: Vec<(Duration, RunEvent)>,
    on_line: Vec<(Duration, RunEvent)>,
    marker: Option<MarkerAction>,
    events: Option<mpsc::Sender<RunEvent>>,
    launched_at: Option<Instant>,
    probe: AgentProbe,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> AgentProbe {
        self.probe.clone()
    }

    /// Make `launch` fail as if the executable did not exist.
    pub fn fail_spawn(mut self, reason: &str) -> Self {
        self.spawn_error = Some(reason.to_string());
        self
    }

    /// Make `send_line` fail as if stdin were closed.
    pub fn reject_stdin(mut self) -> Self {
        self.reject_stdin = true;
        self
    }

    pub fn on_launch(mut self, after_ms: u64, event: RunEvent) -> Self {
        self.on_launch.push((Duration::from_millis(after_ms), event));
        self
    }

    pub fn on_line(mut self, after_ms: u64, event: RunEvent) -> Self {
        self.on_line.push((Duration::from_millis(after_ms), event));
        self
    }

    /// Create `path` with `content` in `fs` as soon as a line arrives.
    pub fn create_marker_on_line(mut self, fs: &MockFileSystem, path: PathBuf, content: &str) -> Self {
        self.marker = Some(MarkerAction {
            fs: fs.clone(),
            path,
            content: content.to_string(),
        });
        self
    }

    fn play(&self, script: &[(Duration, RunEvent)]) {
        let Some(tx) = self.events.clone() else {
            return;
        };
        let base = Instant::now();
        let mut script = script.to_vec();
        script.sort_by_key(|(offset, _)| *offset);

        tokio::spawn(async move {
            for (offset, event) in script {
                tokio::time::sleep_until(base + offset).await;
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
    }
}

impl AgentBackend for ScriptedAgent {
    fn launch(&mut self, events: mpsc::Sender<RunEvent>) -> BackendFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(reason) = &self.spawn_error {
                return Err(AgentExecError::Spawn {
                    command: "scripted-agent".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, reason.clone()),
                });
            }

            self.probe.launched.store(true, Ordering::SeqCst);
            self.launched_at = Some(Instant::now());
            self.events = Some(events);
            let script = self.on_launch.clone();
            self.play(&script);
            Ok(())
        })
    }

    fn send_line(&mut self, line: String) -> BackendFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.reject_stdin {
                return Err(AgentExecError::StdinUnavailable);
            }

            let after_launch = self
                .launched_at
                .map(|t| t.elapsed())
                .unwrap_or_default();
            self.probe.received.lock().unwrap().push(ReceivedLine {
                text: format!("{line}\n"),
                after_launch,
            });

            if let Some(marker) = &self.marker {
                marker.fs.add_file(&marker.path, marker.content.clone());
            }

            let script = self.on_line.clone();
            self.play(&script);
            Ok(())
        })
    }

    fn shutdown(&mut self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.probe.shut_down.store(true, Ordering::SeqCst);
            self.events = None;
        })
    }
}
