// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod exit_codes;
pub mod fs;
pub mod logging;
pub mod output_log;
pub mod report;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::resolve_from_process_env;
use crate::console::StdConsole;
use crate::engine::{RunEvent, Runtime};
use crate::exec::ProcessBackend;
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - configuration (CLI + environment)
/// - the agent process backend
/// - the runtime (core state machine + IO shell)
/// - Ctrl-C handling
///
/// Returns the exit code the process should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = resolve_from_process_env(&args)?;
    info!(
        agent = %config.agent.line,
        shell = config.agent.use_shell,
        work_dir = %config.agent.work_dir.display(),
        "resolved run configuration"
    );

    let backend = ProcessBackend::new(config.agent.clone());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runtime = Runtime::new(&config, backend, fs, Box::new(StdConsole));

    // Ctrl-C → save what we have and stop.
    {
        let tx = runtime.event_sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RunEvent::Interrupted).await;
        });
    }

    let summary = runtime.run().await?;
    debug!(?summary, "run finished");
    Ok(summary.exit_code)
}
