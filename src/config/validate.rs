// src/config/validate.rs

use regex::Regex;

use crate::config::duration::parse_duration;
use crate::config::model::{
    AgentCommand, ArtifactPaths, DEFAULT_AGENT, DEFAULT_RESPONSE_WAIT, DEFAULT_WARMUP, ExitPolicy,
    RawRunConfig, RunConfig, Timing,
};
use crate::errors::{AgentExecError, Result};

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = crate::errors::AgentExecError;

    fn try_from(raw: RawRunConfig) -> std::result::Result<Self, Self::Error> {
        validate_message(&raw)?;
        validate_files(&raw)?;

        let agent = build_agent_command(&raw)?;
        let timing = build_timing(&raw)?;
        let files = ArtifactPaths::in_dir(&raw.work_dir, &raw.output_file, &raw.marker_file);

        Ok(RunConfig {
            message: raw.message,
            agent,
            timing,
            files,
            exit_policy: ExitPolicy { strict: raw.strict },
        })
    }
}

fn validate_message(raw: &RawRunConfig) -> Result<()> {
    if raw.message.is_empty() {
        return Err(AgentExecError::ConfigError(
            "MESSAGE must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_files(raw: &RawRunConfig) -> Result<()> {
    if raw.output_file.trim().is_empty() {
        return Err(AgentExecError::ConfigError(
            "--output-file must not be empty".to_string(),
        ));
    }
    if raw.marker_file.trim().is_empty() {
        return Err(AgentExecError::ConfigError(
            "--marker-file must not be empty".to_string(),
        ));
    }
    if raw.output_file == raw.marker_file {
        return Err(AgentExecError::ConfigError(format!(
            "output file and marker file are both '{}'",
            raw.output_file
        )));
    }
    Ok(())
}

fn build_agent_command(raw: &RawRunConfig) -> Result<AgentCommand> {
    let line = raw
        .agent
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_AGENT)
        .to_string();

    if line.is_empty() {
        return Err(AgentExecError::ConfigError(
            "agent command must not be empty".to_string(),
        ));
    }

    let command = AgentCommand {
        line,
        args: raw.agent_args.clone(),
        use_shell: raw.use_shell,
        work_dir: raw.work_dir.clone(),
    };

    if !command.use_shell {
        let argv = command.argv().map_err(|e| {
            AgentExecError::ConfigError(format!(
                "cannot split agent command '{}': {}",
                command.line, e
            ))
        })?;
        if argv.is_empty() {
            return Err(AgentExecError::ConfigError(
                "agent command must name a program".to_string(),
            ));
        }
    }

    Ok(command)
}

fn build_timing(raw: &RawRunConfig) -> Result<Timing> {
    let warmup = match raw.warmup.as_deref() {
        Some(s) => parse_duration(s)?,
        None => DEFAULT_WARMUP,
    };
    let response_wait = match raw.response_wait.as_deref() {
        Some(s) => parse_duration(s)?,
        None => DEFAULT_RESPONSE_WAIT,
    };
    let ready_pattern = match raw.ready_pattern.as_deref() {
        Some(p) if p.is_empty() => {
            return Err(AgentExecError::ConfigError(
                "--ready-pattern must not be empty".to_string(),
            ));
        }
        Some(p) => Some(Regex::new(p)?),
        None => None,
    };

    Ok(Timing {
        warmup,
        response_wait,
        ready_pattern,
    })
}
