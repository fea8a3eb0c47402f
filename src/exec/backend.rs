// src/exec/backend.rs

//! Pluggable agent backend abstraction.
//!
//! The runtime talks to an `AgentBackend` instead of a raw child process.
//! This makes it easy to swap in a scripted agent in tests while keeping the
//! production process handling in [`super::process`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::AgentCommand;
use crate::engine::RunEvent;
use crate::errors::{AgentExecError, Result};

use super::process::spawn_agent;

/// Boxed future returned by backend methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How long `shutdown` waits for the killed agent to be reaped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Trait abstracting the interactive agent.
///
/// Production code uses [`ProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait AgentBackend: Send {
    /// Start the agent. Output chunks and the final exit are reported on
    /// `events`; an `Err` means the agent never started.
    fn launch(&mut self, events: mpsc::Sender<RunEvent>) -> BackendFuture<'_, Result<()>>;

    /// Type one line (a newline is appended) into the agent.
    fn send_line(&mut self, line: String) -> BackendFuture<'_, Result<()>>;

    /// Stop the agent if it is still running. Called once, when the run ends.
    fn shutdown(&mut self) -> BackendFuture<'_, ()>;
}

/// Real backend that runs the agent as a child process.
#[derive(Debug)]
pub struct ProcessBackend {
    command: AgentCommand,
    stdin: Option<ChildStdin>,
    kill_tx: Option<oneshot::Sender<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl ProcessBackend {
    pub fn new(command: AgentCommand) -> Self {
        Self {
            command,
            stdin: None,
            kill_tx: None,
            watcher: None,
        }
    }
}

impl AgentBackend for ProcessBackend {
    fn launch(&mut self, events: mpsc::Sender<RunEvent>) -> BackendFuture<'_, Result<()>> {
        Box::pin(async move {
            let spawned = spawn_agent(&self.command, events)?;
            self.stdin = spawned.stdin;
            self.kill_tx = Some(spawned.kill_tx);
            self.watcher = Some(spawned.watcher);
            Ok(())
        })
    }

    fn send_line(&mut self, line: String) -> BackendFuture<'_, Result<()>> {
        Box::pin(async move {
            let stdin = self
                .stdin
                .as_mut()
                .ok_or(AgentExecError::StdinUnavailable)?;

            let mut payload = line.into_bytes();
            payload.push(b'\n');
            stdin.write_all(&payload).await?;
            stdin.flush().await?;
            debug!(bytes = payload.len(), "wrote line to agent stdin");
            Ok(())
        })
    }

    fn shutdown(&mut self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            // Closing stdin first lets well-behaved agents notice EOF.
            self.stdin.take();

            if let Some(kill) = self.kill_tx.take() {
                if kill.send(()).is_err() {
                    debug!("agent already exited before shutdown");
                }
            }

            if let Some(watcher) = self.watcher.take() {
                if tokio::time::timeout(SHUTDOWN_GRACE, watcher).await.is_err() {
                    warn!(
                        grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
                        "agent watcher did not finish after shutdown"
                    );
                }
            }
        })
    }
}
