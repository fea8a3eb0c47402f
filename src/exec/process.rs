// src/exec/process.rs

//! Agent process runner.

use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AgentCommand;
use crate::engine::{OutputStream, RunEvent};
use crate::errors::{AgentExecError, Result};

use super::decode::Utf8ChunkDecoder;

const READ_BUFFER_SIZE: usize = 8192;

/// An agent line containing any of these is shell syntax, not a plain
/// command, and is left to the shell to resolve.
const SHELL_SYNTAX: &[char] = &[';', '|', '&', '<', '>', '(', ')', '$', '`', '\n'];

/// Handles to a running agent.
#[derive(Debug)]
pub struct SpawnedAgent {
    pub stdin: Option<ChildStdin>,
    /// Send (or drop) to kill the agent.
    pub kill_tx: oneshot::Sender<()>,
    /// Finishes once the exit was reported or the agent was killed.
    pub watcher: JoinHandle<()>,
}

/// Build the command for the agent: through the platform shell, or direct.
///
/// All three standard streams are piped, and the child runs in the
/// configured working directory.
pub fn build_command(agent: &AgentCommand) -> Result<Command> {
    let mut cmd = if agent.use_shell {
        shell_command(&agent.shell_line())
    } else {
        let argv = agent.argv().map_err(|e| {
            AgentExecError::ConfigError(format!(
                "cannot split agent command '{}': {}",
                agent.line, e
            ))
        })?;
        let (program, args) = argv.split_first().ok_or_else(|| {
            AgentExecError::ConfigError("agent command must name a program".to_string())
        })?;
        let mut c = Command::new(program);
        c.args(args);
        c
    };

    cmd.current_dir(&agent.work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    Ok(cmd)
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(line);
    c
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("cmd");
    // cmd parses its own command line; the line is already quoted for it.
    c.arg("/C").raw_arg(line);
    c
}

/// Program a plain shell-mode agent line starts, e.g. `claude` for
/// `claude --model opus`. `None` in direct mode, for shell syntax, and for
/// lines starting with a variable assignment.
pub fn shell_program(agent: &AgentCommand) -> Option<String> {
    if !agent.use_shell || agent.line.contains(SHELL_SYNTAX) {
        return None;
    }
    let program = shell_words::split(&agent.line).ok()?.into_iter().next()?;
    if program.contains('=') {
        None
    } else {
        Some(program)
    }
}

/// `sh -c` starts fine even when the agent does not exist, so a missing
/// program is looked up here and reported as a spawn failure.
fn check_shell_program(agent: &AgentCommand, shown_cmd: &str) -> Result<()> {
    let Some(program) = shell_program(agent) else {
        return Ok(());
    };

    match which::which_in(&program, std::env::var_os("PATH"), &agent.work_dir) {
        Ok(path) => {
            debug!(program = %program, path = %path.display(), "resolved agent program");
            Ok(())
        }
        Err(e) => Err(AgentExecError::Spawn {
            command: shown_cmd.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, format!("{program}: {e}")),
        }),
    }
}

/// Spawn the agent and start forwarding its output to `events`.
///
/// `AgentExited` is sent only after both output streams are drained, so it
/// is always the last event this agent produces.
pub fn spawn_agent(agent: &AgentCommand, events: mpsc::Sender<RunEvent>) -> Result<SpawnedAgent> {
    let shown_cmd = if agent.use_shell {
        agent.shell_line()
    } else {
        agent.argv().map(|a| a.join(" ")).unwrap_or_else(|_| agent.line.clone())
    };

    check_shell_program(agent, &shown_cmd)?;

    let mut cmd = build_command(agent)?;
    let mut child = cmd.spawn().map_err(|source| AgentExecError::Spawn {
        command: shown_cmd.clone(),
        source,
    })?;

    info!(
        pid = child.id(),
        command = %shown_cmd,
        shell = agent.use_shell,
        "agent process started"
    );

    let stdin = child.stdin.take();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_stream(
            stdout,
            OutputStream::Stdout,
            events.clone(),
        )));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_stream(
            stderr,
            OutputStream::Stderr,
            events.clone(),
        )));
    }

    let (kill_tx, kill_rx) = oneshot::channel();
    let watcher = tokio::spawn(watch_exit(child, readers, kill_rx, events));

    Ok(SpawnedAgent {
        stdin,
        kill_tx,
        watcher,
    })
}

/// Read one output pipe until EOF, sending each decoded chunk as it arrives.
async fn forward_stream<R>(mut reader: R, stream: OutputStream, events: mpsc::Sender<RunEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = Utf8ChunkDecoder::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let chunk = match reader.read(&mut buf).await {
            Ok(0) => {
                if let Some(tail) = decoder.finish() {
                    let _ = events.send(RunEvent::Output { stream, chunk: tail }).await;
                }
                break;
            }
            Ok(n) => decoder.push(&buf[..n]),
            Err(e) => {
                warn!(?stream, error = %e, "error reading agent output");
                break;
            }
        };

        if let Some(chunk) = chunk {
            if events.send(RunEvent::Output { stream, chunk }).await.is_err() {
                debug!(?stream, "runtime gone; stopping output forwarding");
                break;
            }
        }
    }

    debug!(?stream, "agent output stream closed");
}

/// Wait for the agent to exit (or for a kill request) and report the exit.
async fn watch_exit(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    mut kill_rx: oneshot::Receiver<()>,
    events: mpsc::Sender<RunEvent>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut kill_rx => {
            info!("stopping agent process");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill agent process");
            }
            // The run is over; no exit event for a process we killed.
            return;
        }
    };

    for reader in readers {
        let _ = reader.await;
    }

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(error = %e, "failed to wait for agent process");
            None
        }
    };

    info!(exit_code = ?code, "agent process exited");
    let _ = events.send(RunEvent::AgentExited { code }).await;
}
