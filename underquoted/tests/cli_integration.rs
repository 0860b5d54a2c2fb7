//! CLI integration tests for underquoted

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const USAGE: &str =
    "You must specify a single command, either 'post_message' or 'reply_to_mentions'";

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

/// Command with every configuration variable cleared
fn underquoted() -> Command {
    let mut cmd = Command::cargo_bin("underquoted").unwrap();
    for key in [
        "UNDERQUOTED_CONFIG",
        "UNDERQUOTED_CURSOR_DB",
        "UNDERQUOTED_LOG_FORMAT",
        "UNDERQUOTED_LOG_LEVEL",
        "QUOTATION_URL",
        "MASTODON_INSTANCE",
        "MASTODON_TOKEN_FILE",
        "MASTODON_ACCESS_TOKEN",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

/// Write a config file whose token file holds `token`
fn setup_test_env(token: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let token_path = temp_dir.path().join("mastodon.token");
    let db_path = temp_dir.path().join("data").join("cursor.db");
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&token_path, token).unwrap();
    fs::write(
        &config_path,
        format!(
            r#"
[quotations]
url = "http://127.0.0.1:9/quotations?format=json"

[mastodon]
instance = "http://127.0.0.1:9"
token_file = "{}"

[cursor]
path = "{}"
"#,
            escape_path_for_toml(&token_path),
            escape_path_for_toml(&db_path)
        ),
    )
    .unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

#[test]
fn test_help_flag_output() {
    underquoted()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Answer mentions with quotations"))
        .stdout(predicate::str::contains("post_message"))
        .stdout(predicate::str::contains("reply_to_mentions"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--log-format"));
}

#[test]
fn test_version_flag_output() {
    underquoted()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("underquoted"));
}

#[test]
fn test_no_command_prints_usage() {
    underquoted()
        .assert()
        .code(64)
        .stdout(predicate::str::contains(USAGE));
}

#[test]
fn test_unknown_command_prints_usage() {
    underquoted()
        .arg("tweet")
        .assert()
        .code(64)
        .stdout(predicate::str::contains(USAGE));
}

#[test]
fn test_two_commands_print_usage() {
    underquoted()
        .args(["post_message", "reply_to_mentions"])
        .assert()
        .code(64)
        .stdout(predicate::str::contains(USAGE));
}

#[test]
fn test_invalid_log_format_is_rejected() {
    underquoted()
        .args(["post_message", "--log-format", "xml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid log format: 'xml'"));
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("absent.toml");

    underquoted()
        .arg("post_message")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_config_from_environment_variable() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[quotations]\nurl = \"http://127.0.0.1:9/\"\n").unwrap();

    underquoted()
        .arg("reply_to_mentions")
        .env("UNDERQUOTED_CONFIG", &config_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("mastodon.instance"));
}

#[test]
fn test_invalid_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[quotations\nurl = ").unwrap();

    underquoted()
        .arg("post_message")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_empty_token_file_is_authentication_error() {
    let (_temp_dir, config_path) = setup_test_env("  \n");

    underquoted()
        .args(["reply_to_mentions", "--config", &config_path])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("access token is empty"));
}

#[test]
fn test_environment_overrides_missing_token() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[mastodon]\ninstance = \"http://127.0.0.1:9\"\n",
    )
    .unwrap();

    underquoted()
        .args(["post_message", "--config"])
        .arg(&config_path)
        .env("QUOTATION_URL", "http://127.0.0.1:9/")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MASTODON_ACCESS_TOKEN"));
}
