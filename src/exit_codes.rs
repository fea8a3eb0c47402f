//! Stable exit codes for `agentexec`.
//!
//! When the agent exits on its own before the report is written, the
//! orchestrator adopts the agent's exit code instead of any of these.

/// The save-and-report sequence completed.
pub const OK: i32 = 0;
/// Usage error, spawn failure, or an internal error.
pub const FAILURE: i32 = 1;
/// `--strict` run whose marker file was not found.
pub const MARKER_MISSING: i32 = 3;
/// Interrupted by Ctrl-C.
pub const INTERRUPTED: i32 = 130;
