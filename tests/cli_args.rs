//! Integration tests for CLI argument handling
//!
//! Runs the valuecache binary against a temporary store directory. The URL
//! used points at a closed local port, so any test that reaches the network
//! sees a fetch failure.

use std::process::Command;

use serde_json::json;
use tempfile::TempDir;
use valuecache::FileStore;

const UNREACHABLE_URL: &str = "http://127.0.0.1:9/settings.json";

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_valuecache"))
        .args(args)
        .output()
        .expect("Failed to execute valuecache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("valuecache"), "Help should mention valuecache");
    assert!(stdout.contains("--url"), "Help should mention --url flag");
    assert!(stdout.contains("--refresh"), "Help should mention --refresh flag");
}

#[test]
fn test_missing_url_is_rejected() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--url"), "Should name the missing flag: {}", stderr);
}

#[test]
fn test_invalid_url_prints_error_and_exits() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--url", "ftp://example.com/x", "--cache-dir", dir]);

    assert!(!output.status.success(), "Expected invalid URL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid URL"), "Should explain the URL problem: {}", stderr);
}

#[test]
fn test_invalid_key_prints_error_and_exits() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--url", UNREACHABLE_URL, "--key", "a/b", "--cache-dir", dir]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid key"), "Should explain the key problem: {}", stderr);
}

#[test]
fn test_stored_value_is_printed_without_fetching() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::with_dir(temp_dir.path().to_path_buf());
    store
        .write("settings", &json!({"theme": "dark", "enabled": false}))
        .unwrap();

    let dir = temp_dir.path().to_str().unwrap();
    let output = run_cli(&["--url", UNREACHABLE_URL, "--key", "settings", "--cache-dir", dir]);

    assert!(
        output.status.success(),
        "A stored value should be served without the network: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let printed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(printed, json!({"theme": "dark", "enabled": false}));
}

#[test]
fn test_miss_with_unreachable_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--url", UNREACHABLE_URL, "--cache-dir", dir]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to fetch"), "Should report the fetch failure: {}", stderr);
}

#[test]
fn test_refresh_flag_goes_to_source_even_when_stored() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::with_dir(temp_dir.path().to_path_buf());
    store.write("default", &json!(1)).unwrap();

    let dir = temp_dir.path().to_str().unwrap();
    let output = run_cli(&["--url", UNREACHABLE_URL, "--cache-dir", dir, "--refresh"]);

    assert!(!output.status.success(), "--refresh should hit the (unreachable) source");
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use valuecache::cli::{parse_url_arg, Cli, CliError, StartupConfig};

    #[test]
    fn test_cli_parses_key_and_refresh() {
        let cli = Cli::parse_from(["valuecache", "--url", "https://a.test/v", "--key", "k1", "--refresh"]);
        assert_eq!(cli.key, "k1");
        assert!(cli.refresh);
    }

    #[test]
    fn test_parse_url_arg_rejects_relative() {
        assert!(matches!(parse_url_arg("v.json"), Err(CliError::InvalidUrl(_))));
    }

    #[test]
    fn test_startup_config_without_watch() {
        let cli = Cli::parse_from(["valuecache", "--url", "https://a.test/v", "--cache-dir", "/tmp/x"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.watch.is_none());
        assert!(!config.force_refresh);
        assert!(config.ttl_hours.is_none());
    }
}
