//! CLI integration tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
default_interpreter = "sh"

[[interpreter]]
name = "sh"
class = "shell"

[interpreter.properties]
"shell.timeout_ms" = "5000"

[[interpreter]]
name = "echo"
class = "mock"
lazy = false
"#;

fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("interpreters.toml");
    fs::write(&path, CONFIG).unwrap();
    path
}

fn nbinterp() -> Command {
    let mut cmd = Command::cargo_bin("nbinterp").unwrap();
    cmd.env_remove("NBINTERP_DEFAULT_INTERPRETER")
        .env_remove("NBINTERP_USER");
    cmd
}

#[test]
fn test_help() {
    nbinterp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("complete"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_list_marks_default() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sh"))
        .stdout(predicate::str::contains("shell, lazy"))
        .stdout(predicate::str::contains("echo"));
}

#[test]
fn test_run_mock_echoes_statement() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .args(["run", "-i", "echo", "hello", "world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn test_run_json_output() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .args(["run", "-i", "echo", "--json", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"code\": \"success\""));
}

#[cfg(unix)]
#[test]
fn test_run_shell_default_interpreter() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .args(["run", "echo", "from-shell"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-shell"));
}

#[cfg(unix)]
#[test]
fn test_run_failing_statement_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .args(["run", "exit 4"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("exit status: 4"));
}

#[cfg(unix)]
#[test]
fn test_complete_shell() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .args(["complete", "s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sh\t"));
}

#[test]
fn test_unknown_interpreter_shows_fix() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    nbinterp()
        .arg("--config")
        .arg(&config)
        .args(["run", "-i", "python", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NBI-031"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();

    nbinterp()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NBI-040"));
}
