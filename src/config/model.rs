// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::exit_codes;

/// Agent started when neither `--agent` nor `AGENTEXEC_AGENT` is given.
pub const DEFAULT_AGENT: &str = "claude";
pub const DEFAULT_WARMUP: Duration = Duration::from_millis(5000);
pub const DEFAULT_RESPONSE_WAIT: Duration = Duration::from_millis(12000);
pub const DEFAULT_OUTPUT_FILE: &str = "terminal_output.txt";
pub const DEFAULT_MARKER_FILE: &str = "success.txt";

/// Unvalidated settings after CLI and environment have been merged.
///
/// Optional fields are still `None` when neither source provided them;
/// defaults are applied during validation.
#[derive(Debug, Clone)]
pub struct RawRunConfig {
    pub message: String,
    pub agent_args: Vec<String>,
    pub agent: Option<String>,
    pub use_shell: bool,
    pub warmup: Option<String>,
    pub response_wait: Option<String>,
    pub ready_pattern: Option<String>,
    pub output_file: String,
    pub marker_file: String,
    pub strict: bool,
    pub work_dir: PathBuf,
}

impl RawRunConfig {
    /// Minimal raw config with every optional setting left at its default.
    pub fn new(message: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            message: message.into(),
            agent_args: Vec::new(),
            agent: None,
            use_shell: true,
            warmup: None,
            response_wait: None,
            ready_pattern: None,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            marker_file: DEFAULT_MARKER_FILE.to_string(),
            strict: false,
            work_dir: work_dir.into(),
        }
    }
}

/// Validated configuration for a single orchestrated run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Line typed into the agent (without the trailing newline).
    pub message: String,
    pub agent: AgentCommand,
    pub timing: Timing,
    pub files: ArtifactPaths,
    pub exit_policy: ExitPolicy,
}

/// How to start the agent process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCommand {
    /// Agent command as configured; may itself contain arguments.
    pub line: String,
    /// Pass-through arguments from the command line.
    pub args: Vec<String>,
    /// Run through `sh -c` / `cmd /C` rather than exec'ing directly.
    pub use_shell: bool,
    pub work_dir: PathBuf,
}

impl AgentCommand {
    /// Single command line handed to the shell.
    ///
    /// The configured agent line is used as-is; pass-through arguments are
    /// quoted for the platform shell (POSIX `sh`, or `cmd` on Windows) so
    /// they reach the agent verbatim.
    pub fn shell_line(&self) -> String {
        if self.args.is_empty() {
            return self.line.clone();
        }
        let args = if cfg!(windows) {
            join_for_cmd(&self.args)
        } else {
            shell_words::join(&self.args)
        };
        format!("{} {}", self.line, args)
    }

    /// Program followed by its arguments, for direct spawning.
    pub fn argv(&self) -> std::result::Result<Vec<String>, shell_words::ParseError> {
        let mut argv = shell_words::split(&self.line)?;
        argv.extend(self.args.iter().cloned());
        Ok(argv)
    }
}

/// Quote arguments for a `cmd /C` line using the MSVC argument rules most
/// Windows programs parse their command line with.
pub fn join_for_cmd(args: &[String]) -> String {
    args.iter()
        .map(String::as_str)
        .map(quote_for_cmd)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_for_cmd(arg: &str) -> String {
    const NEEDS_QUOTES: &[char] = &[' ', '\t', '"', '&', '|', '<', '>', '^', '(', ')'];
    if !arg.is_empty() && !arg.contains(NEEDS_QUOTES) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                // Backslashes before a quote are escaped, then the quote.
                quoted.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            _ => {
                quoted.extend(std::iter::repeat_n('\\', backslashes));
                quoted.push(c);
                backslashes = 0;
            }
        }
    }
    // Trailing backslashes must not escape the closing quote.
    quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    quoted
}

/// Delays and readiness detection.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Deadline for sending the message, measured from start.
    pub warmup: Duration,
    /// Time the agent gets to respond, measured from sending the message.
    pub response_wait: Duration,
    /// Output pattern that lets the message go out before `warmup`.
    pub ready_pattern: Option<Regex>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            warmup: DEFAULT_WARMUP,
            response_wait: DEFAULT_RESPONSE_WAIT,
            ready_pattern: None,
        }
    }
}

/// Files read or written in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub output: PathBuf,
    pub marker: PathBuf,
    /// Names as configured, for messages shown to the operator.
    pub output_name: String,
    pub marker_name: String,
}

impl ArtifactPaths {
    pub fn in_dir(work_dir: &Path, output: &str, marker: &str) -> Self {
        Self {
            output: work_dir.join(output),
            marker: work_dir.join(marker),
            output_name: output.to_string(),
            marker_name: marker.to_string(),
        }
    }
}

/// Exit code once the save-and-report sequence has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitPolicy {
    /// Report a missing marker through the exit code.
    pub strict: bool,
}

impl ExitPolicy {
    pub fn code_for(&self, marker_found: bool) -> i32 {
        if marker_found || !self.strict {
            exit_codes::OK
        } else {
            exit_codes::MARKER_MISSING
        }
    }
}
