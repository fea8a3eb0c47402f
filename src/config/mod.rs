// src/config/mod.rs

//! Run configuration.
//!
//! There is no configuration file: settings come from CLI flags, then
//! `AGENTEXEC_*` environment variables, then built-in defaults. They are
//! collected into a [`RawRunConfig`] and validated into a [`RunConfig`] via
//! `TryFrom`, so the rest of the crate only ever sees checked values.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{resolve, resolve_from_process_env};
pub use model::{AgentCommand, ArtifactPaths, ExitPolicy, RawRunConfig, RunConfig, Timing};
