#![allow(dead_code)]

use std::path::PathBuf;

use agentexec::config::{RawRunConfig, RunConfig};

/// Builder for `RunConfig` to simplify test setup.
///
/// Starts from the defaults (`claude`, 5s warm-up, 12s response window,
/// `terminal_output.txt`, `success.txt`) in the working directory `.`.
pub struct RunConfigBuilder {
    raw: RawRunConfig,
}

impl RunConfigBuilder {
    pub fn new(message: &str) -> Self {
        Self {
            raw: RawRunConfig::new(message, "."),
        }
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw.work_dir = dir.into();
        self
    }

    pub fn agent(mut self, line: &str) -> Self {
        self.raw.agent = Some(line.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.raw.agent_args.push(arg.to_string());
        self
    }

    pub fn no_shell(mut self) -> Self {
        self.raw.use_shell = false;
        self
    }

    pub fn warmup(mut self, dur: &str) -> Self {
        self.raw.warmup = Some(dur.to_string());
        self
    }

    pub fn response_wait(mut self, dur: &str) -> Self {
        self.raw.response_wait = Some(dur.to_string());
        self
    }

    pub fn ready_pattern(mut self, pattern: &str) -> Self {
        self.raw.ready_pattern = Some(pattern.to_string());
        self
    }

    pub fn strict(mut self) -> Self {
        self.raw.strict = true;
        self
    }

    pub fn raw(self) -> RawRunConfig {
        self.raw
    }

    pub fn build(self) -> RunConfig {
        RunConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}
