// src/config/loader.rs

use std::path::PathBuf;

use anyhow::Context;

use crate::cli::CliArgs;
use crate::config::model::{RawRunConfig, RunConfig};
use crate::errors::Result;

pub const AGENT_ENV: &str = "AGENTEXEC_AGENT";
pub const WARMUP_ENV: &str = "AGENTEXEC_WARMUP";
pub const RESPONSE_WAIT_ENV: &str = "AGENTEXEC_RESPONSE_WAIT";

/// Merge CLI arguments with environment lookups and validate the result.
///
/// A CLI flag always wins over its environment variable. `env` is a lookup
/// function so tests can supply a fixed environment.
pub fn resolve<F>(args: &CliArgs, work_dir: PathBuf, env: F) -> Result<RunConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = RawRunConfig {
        message: args.message().to_string(),
        agent_args: args.agent_args().to_vec(),
        agent: args.agent.clone().or_else(|| env(AGENT_ENV)),
        use_shell: !args.no_shell,
        warmup: args.warmup.clone().or_else(|| env(WARMUP_ENV)),
        response_wait: args
            .response_wait
            .clone()
            .or_else(|| env(RESPONSE_WAIT_ENV)),
        ready_pattern: args.ready_pattern.clone(),
        output_file: args.output_file.clone(),
        marker_file: args.marker_file.clone(),
        strict: args.strict,
        work_dir,
    };

    RunConfig::try_from(raw)
}

/// [`resolve`] against the real process environment and working directory.
pub fn resolve_from_process_env(args: &CliArgs) -> Result<RunConfig> {
    let work_dir = std::env::current_dir().context("reading current working directory")?;
    resolve(args, work_dir, |key| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    })
}
