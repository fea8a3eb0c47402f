// tests/real_fs.rs

use agentexec::fs::{FileSystem, RealFileSystem};
use tempfile::TempDir;

#[test]
fn write_replaces_previous_output() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("terminal_output.txt");
    let fs = RealFileSystem;

    fs.write(&path, b"a much longer first run\n")?;
    fs.write(&path, b"short\n")?;

    assert_eq!(fs.read_to_string(&path)?, "short\n");
    assert!(fs.is_file(&path));
    Ok(())
}

#[test]
fn failed_save_names_the_output_file() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("missing-dir").join("terminal_output.txt");

    let err = RealFileSystem.write(&path, b"x").unwrap_err();

    let msg = format!("{err:#}");
    assert!(msg.contains("saving agent output to"), "{msg}");
    assert!(msg.contains("terminal_output.txt"), "{msg}");
    Ok(())
}
