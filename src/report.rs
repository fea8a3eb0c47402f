// src/report.rs

//! Marker-file probe and the end-of-run report.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ArtifactPaths;
use crate::fs::FileSystem;

/// What was found at the marker path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerStatus {
    Found { content: String },
    /// Something exists at the marker path but could not be read.
    Unreadable { reason: String },
    Missing,
}

impl MarkerStatus {
    /// Existence alone is the success signal.
    pub fn is_present(&self) -> bool {
        !matches!(self, MarkerStatus::Missing)
    }
}

/// Check for the marker file and read it if present.
pub fn probe_marker(fs: &dyn FileSystem, path: &Path) -> MarkerStatus {
    if !fs.exists(path) {
        debug!(path = %path.display(), "marker file not found");
        return MarkerStatus::Missing;
    }

    if !fs.is_file(path) {
        warn!(path = %path.display(), "marker path exists but is not a file");
        return MarkerStatus::Unreadable {
            reason: "not a regular file".to_string(),
        };
    }

    match fs.read_to_string(path) {
        Ok(content) => MarkerStatus::Found { content },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read marker file");
            MarkerStatus::Unreadable {
                reason: format!("{e:#}"),
            }
        }
    }
}

/// Operator-facing summary printed once the run has been saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output_name: String,
    pub marker_name: String,
    pub marker: MarkerStatus,
}

impl RunReport {
    pub fn new(files: &ArtifactPaths, marker: MarkerStatus) -> Self {
        Self {
            output_name: files.output_name.clone(),
            marker_name: files.marker_name.clone(),
            marker,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.marker.is_present()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.marker {
            MarkerStatus::Found { content } => {
                writeln!(f, "[SUCCESS] Agent created {}!", self.marker_name)?;
                writeln!(f, "Content: {content}")
            }
            MarkerStatus::Unreadable { reason } => {
                writeln!(f, "[SUCCESS] Agent created {}!", self.marker_name)?;
                writeln!(f, "[!] Could not read {}: {reason}", self.marker_name)
            }
            MarkerStatus::Missing => {
                writeln!(f, "[FAILED] No {} found", self.marker_name)?;
                writeln!(
                    f,
                    "[i] Check {} to see what happened",
                    self.output_name
                )
            }
        }
    }
}
