// tests/report.rs

use std::path::Path;

use agentexec::config::ArtifactPaths;
use agentexec::fs::mock::MockFileSystem;
use agentexec::report::{probe_marker, MarkerStatus, RunReport};

fn files() -> ArtifactPaths {
    ArtifactPaths::in_dir(Path::new("."), "terminal_output.txt", "success.txt")
}

#[test]
fn probe_reads_marker_content() {
    let fs = MockFileSystem::new();
    fs.add_file("./success.txt", "done");

    let status = probe_marker(&fs, Path::new("./success.txt"));
    assert_eq!(
        status,
        MarkerStatus::Found {
            content: "done".to_string()
        }
    );
    assert!(status.is_present());
}

#[test]
fn probe_missing_marker() {
    let fs = MockFileSystem::new();
    let status = probe_marker(&fs, Path::new("./success.txt"));
    assert_eq!(status, MarkerStatus::Missing);
    assert!(!status.is_present());
}

#[test]
fn directory_at_marker_path_counts_as_present_but_unreadable() {
    let fs = MockFileSystem::new();
    fs.add_dir("./success.txt");

    let status = probe_marker(&fs, Path::new("./success.txt"));
    assert!(matches!(status, MarkerStatus::Unreadable { .. }));
    assert!(status.is_present());
}

#[test]
fn success_report_text() {
    let report = RunReport::new(
        &files(),
        MarkerStatus::Found {
            content: "done".to_string(),
        },
    );
    assert!(report.succeeded());
    assert_eq!(
        report.to_string(),
        "[SUCCESS] Agent created success.txt!\nContent: done\n"
    );
}

#[test]
fn failure_report_points_at_output_file() {
    let report = RunReport::new(&files(), MarkerStatus::Missing);
    assert!(!report.succeeded());
    assert_eq!(
        report.to_string(),
        "[FAILED] No success.txt found\n[i] Check terminal_output.txt to see what happened\n"
    );
}
