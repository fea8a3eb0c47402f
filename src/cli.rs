// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `agentexec`.
///
/// Our own options must come before `MESSAGE`. Option parsing stops at
/// `MESSAGE`: everything after it, including `--help` or our own flag names,
/// is handed to the agent untouched.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "agentexec",
    version,
    about = "Start an interactive agent, type one message into it, and check for a success marker.",
    long_about = None
)]
pub struct CliArgs {
    /// MESSAGE (the line typed into the agent's stdin once it is ready),
    /// followed by AGENT_ARGS forwarded verbatim to the agent.
    #[arg(
        value_name = "MESSAGE",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    pub invocation: Vec<String>,

    /// Command used to start the agent.
    ///
    /// If omitted, `AGENTEXEC_AGENT` or `claude` (looked up on PATH) is used.
    #[arg(long, value_name = "CMD")]
    pub agent: Option<String>,

    /// Spawn the agent directly instead of through the platform shell.
    #[arg(long)]
    pub no_shell: bool,

    /// Delay before the message is sent (e.g. "5s", "750ms").
    ///
    /// If omitted, `AGENTEXEC_WARMUP` or 5s is used.
    #[arg(long, value_name = "DURATION")]
    pub warmup: Option<String>,

    /// Delay between sending the message and saving the output.
    ///
    /// If omitted, `AGENTEXEC_RESPONSE_WAIT` or 12s is used.
    #[arg(long, value_name = "DURATION")]
    pub response_wait: Option<String>,

    /// Send the message as soon as the agent's output matches this regex.
    ///
    /// The warm-up delay still applies as a deadline if it never matches.
    #[arg(long, value_name = "REGEX")]
    pub ready_pattern: Option<String>,

    /// File the captured output is written to.
    #[arg(long, value_name = "PATH", default_value = "terminal_output.txt")]
    pub output_file: String,

    /// File whose presence signals that the agent finished its task.
    #[arg(long, value_name = "PATH", default_value = "success.txt")]
    pub marker_file: String,

    /// Exit with code 3 when the marker file is missing.
    #[arg(long)]
    pub strict: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AGENTEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// Line typed into the agent.
    pub fn message(&self) -> &str {
        self.invocation.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments forwarded to the agent.
    pub fn agent_args(&self) -> &[String] {
        self.invocation.get(1..).unwrap_or_default()
    }
}

/// Parse `std::env::args`, returning clap's error instead of exiting so the
/// caller controls the exit code.
pub fn try_parse() -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse()
}
