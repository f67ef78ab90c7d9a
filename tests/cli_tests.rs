//! CLI Integration Tests for GLIMPS
//!
//! Runs the built `glimps` binary in a scratch directory with an isolated
//! session file. Nothing here needs a running backend.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PDB: &str = "ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N\nEND\n";

/// Run glimps inside `dir`, with the session stored there too
fn run_glimps(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glimps"))
        .args(args)
        .current_dir(dir)
        .env("GLIMPS_SESSION_FILE", dir.join("session.json"))
        .env("GLIMPS_API_URL", "http://127.0.0.1:9")
        .env_remove("RUST_LOG")
        .env_remove("GLIMPS_PASSWORD")
        .output()
        .expect("Failed to execute command")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_glimps(&["--help"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("GLIMPS"));
    for command in ["login", "projects", "molecules", "models", "jobs", "view"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_glimps(&["--version"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_command_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_glimps(&["simulate"], dir.path());
    assert!(!output.status.success());
}

// =============================================================================
// Route Guard Tests
// =============================================================================

#[test]
fn test_protected_command_requires_session() {
    let dir = TempDir::new().unwrap();
    let output = run_glimps(&["--no-color", "jobs", "list"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not signed in"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("glimps login"));
}

#[test]
fn test_logout_without_session_succeeds() {
    let dir = TempDir::new().unwrap();
    let output = run_glimps(&["--no-color", "logout"], dir.path());

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Signed out"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_shows_effective_values() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("glimps.toml"),
        "[jobs]\npoll_interval_secs = 3\nmax_backoff_secs = 30\n",
    )
    .unwrap();

    let output = run_glimps(&["config"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[api]"));
    assert!(stdout.contains("http://127.0.0.1:9"));
    assert!(stdout.contains("poll_interval_secs = 3"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("custom.toml"),
        "[jobs]\npoll_interval_secs = 10\nmax_backoff_secs = 5\n",
    )
    .unwrap();

    let output = run_glimps(&["--config", "custom.toml", "config", "--validate"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_backoff_secs"));
}

// =============================================================================
// View Command Tests
// =============================================================================

#[test]
fn test_view_exports_page() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("lysozyme.pdb"), PDB).unwrap();

    let output = run_glimps(
        &["--no-color", "view", "lysozyme.pdb", "--type", "cg"],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let page = fs::read_to_string(dir.path().join("lysozyme.html")).unwrap();
    assert!(page.contains("3Dmol-min.js"));
    assert!(page.contains("viewer.addModel("));
    assert!(page.contains("\"sphere\""));
    assert!(page.contains("ALA"));
}

#[test]
fn test_view_empty_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("empty.gro"), "").unwrap();

    let output = run_glimps(&["--no-color", "view", "empty.gro"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nothing to show"));
    assert!(!dir.path().join("empty.html").exists());
}

#[test]
fn test_view_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_glimps(&["--no-color", "view", "missing.pdb"], dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}
