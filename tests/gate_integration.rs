//! Integration tests for the permission gate and hook dispatcher
//!
//! These tests drive the compiled binary the way a host agent runtime
//! would: settings file on disk, payload on stdin, decision in the exit
//! code.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Helper to get the gatehouse binary path
fn gatehouse_binary() -> PathBuf {
    // When running tests, the binary is in target/debug/gatehouse
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("gatehouse");
    path
}

fn write_settings(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("settings.json");
    fs::write(&path, content).unwrap();
    path
}

/// Helper to run gatehouse against a settings file
fn run_gatehouse(settings: &Path, args: &[&str]) -> std::process::Output {
    Command::new(gatehouse_binary())
        .arg("--config")
        .arg(settings)
        .args(args)
        .output()
        .expect("Failed to execute gatehouse")
}

/// Helper to run gatehouse with a JSON payload on stdin
fn run_gatehouse_with_stdin(settings: &Path, args: &[&str], stdin: &str) -> std::process::Output {
    let mut child = Command::new(gatehouse_binary())
        .arg("--config")
        .arg(settings)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn gatehouse");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();

    child.wait_with_output().expect("Failed to wait for gatehouse")
}

#[test]
fn gate_allows_when_nothing_is_configured() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(temp.path(), "{}");

    let output = run_gatehouse(&settings, &["gate", "--tool", "Bash", "--arguments", "ls"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn gate_denies_by_rule() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{ "permissions": { "deny": ["Bash(rm *)"] } }"#,
    );

    let output = run_gatehouse(&settings, &["gate", "--tool", "Bash", "--arguments", "rm -rf /tmp/x"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bash(rm *)"), "stderr: {stderr}");
}

#[test]
fn gate_applies_the_unmatched_disposition() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{ "permissions": { "allow": ["Bash(uv:*)"], "unmatched": "deny" } }"#,
    );

    let allowed = run_gatehouse(
        &settings,
        &["gate", "--tool", "Bash", "--arguments", "uv run script.py"],
    );
    assert_eq!(allowed.status.code(), Some(0));

    let denied = run_gatehouse(
        &settings,
        &["gate", "--tool", "Bash", "--arguments", "curl http://x"],
    );
    assert_eq!(denied.status.code(), Some(2));

    let near_miss = run_gatehouse(
        &settings,
        &["gate", "--tool", "Bash", "--arguments", "uvx script.py"],
    );
    assert_eq!(near_miss.status.code(), Some(2));
}

#[test]
fn pre_hook_denial_blocks_the_gate() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("after");
    let settings = write_settings(
        temp.path(),
        &format!(
            r#"{{
              "hooks": {{
                "PreToolUse": [
                  {{ "hooks": [
                      {{ "type": "command", "command": "echo forbidden >&2; exit 2" }},
                      {{ "type": "command", "command": "touch {marker}" }}
                  ] }}
                ]
              }}
            }}"#,
            marker = marker.display()
        ),
    );

    let output = run_gatehouse(&settings, &["gate", "--tool", "Bash", "--arguments", "ls"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("forbidden"), "stderr: {stderr}");
    assert!(!marker.exists(), "a blocked dispatch must not run later commands");
}

#[test]
fn dispatch_runs_bindings_in_declared_order() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("order");
    let settings = write_settings(
        temp.path(),
        &format!(
            r#"{{
              "hooks": {{
                "PostToolUse": [
                  {{ "hooks": [ {{ "type": "command", "command": "echo lint >> {marker}" }} ] }},
                  {{ "hooks": [ {{ "type": "command", "command": "echo format >> {marker}" }} ] }},
                  {{ "hooks": [ {{ "type": "command", "command": "echo notify >> {marker}" }} ] }}
                ]
              }}
            }}"#,
            marker = marker.display()
        ),
    );

    let payload = r#"{ "tool_name": "Bash", "tool_input": "ls", "session_id": "s1", "invocation_id": "i1" }"#;
    let output = run_gatehouse_with_stdin(&settings, &["hook", "dispatch", "post-tool-use"], payload);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(&marker).unwrap(), "lint\nformat\nnotify\n");
}

#[test]
fn dispatch_is_fail_open_after_the_tool_ran() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("ran");
    let settings = write_settings(
        temp.path(),
        &format!(
            r#"{{
              "hooks": {{
                "Stop": [
                  {{ "hooks": [
                      {{ "type": "command", "command": "exit 1" }},
                      {{ "type": "command", "command": "touch {marker}" }}
                  ] }}
                ]
              }}
            }}"#,
            marker = marker.display()
        ),
    );

    let output = run_gatehouse_with_stdin(&settings, &["hook", "dispatch", "stop"], "{}");
    assert_eq!(output.status.code(), Some(0), "session events never block");
    assert!(marker.exists(), "later commands still run after a failure");
}

#[test]
fn dispatch_respects_matchers() {
    let temp = TempDir::new().unwrap();
    let bash_marker = temp.path().join("bash");
    let all_marker = temp.path().join("all");
    let settings = write_settings(
        temp.path(),
        &format!(
            r#"{{
              "hooks": {{
                "PostToolUse": [
                  {{ "matcher": "Bash", "hooks": [ {{ "type": "command", "command": "touch {bash}" }} ] }},
                  {{ "hooks": [ {{ "type": "command", "command": "touch {all}" }} ] }}
                ]
              }}
            }}"#,
            bash = bash_marker.display(),
            all = all_marker.display()
        ),
    );

    let payload = r#"{ "tool_name": "Edit", "tool_input": "src/main.rs" }"#;
    let output = run_gatehouse(
        &settings,
        &["hook", "dispatch", "PostToolUse", "--payload", payload],
    );
    assert_eq!(output.status.code(), Some(0));
    assert!(!bash_marker.exists());
    assert!(all_marker.exists());
}

#[test]
fn pre_hook_timeout_blocks() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{
          "hooks": {
            "PreToolUse": [
              { "hooks": [ { "type": "command", "command": "sleep 30", "timeout": 1 } ] }
            ]
          }
        }"#,
    );

    let output = run_gatehouse(&settings, &["gate", "--tool", "Bash", "--arguments", "ls"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timed out"), "stderr: {stderr}");
}

#[test]
fn malformed_pattern_aborts_startup() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{ "permissions": { "allow": ["Bash(broken"] } }"#,
    );

    let output = run_gatehouse(&settings, &["check", "--tool", "Bash", "--arguments", "ls"]);
    assert_ne!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bash(broken"), "stderr: {stderr}");
}

#[test]
fn unknown_event_key_aborts_startup() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{ "hooks": { "SessionStart": [ { "hooks": [ { "type": "command", "command": "true" } ] } ] } }"#,
    );

    let output = run_gatehouse_with_stdin(&settings, &["hook", "dispatch", "stop"], "{}");
    assert_ne!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SessionStart"), "stderr: {stderr}");
}

#[test]
fn check_reports_the_matching_rule() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{ "permissions": { "allow": ["Bash(uv:*)"], "deny": ["Bash(rm *)"] } }"#,
    );

    let allowed = run_gatehouse(&settings, &["check", "--tool", "Bash", "--arguments", "uv run x.py"]);
    assert_eq!(allowed.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&allowed.stdout).contains("Bash(uv:*)"));

    let denied = run_gatehouse(&settings, &["check", "--tool", "Bash", "--arguments", "rm -rf /"]);
    assert_eq!(denied.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&denied.stdout).contains("Bash(rm *)"));
}

#[test]
fn hook_list_reports_bindings_as_json() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(
        temp.path(),
        r#"{
          "hooks": {
            "PostToolUse": [
              { "matcher": "Bash", "hooks": [ { "type": "command", "command": "fmt-pass" } ] }
            ]
          }
        }"#,
    );

    let output = run_gatehouse(&settings, &["hook", "list", "-o", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing[0]["event"], "PostToolUse");
    assert_eq!(listing[0]["bindings"][0]["matcher"], "Bash");
    assert_eq!(listing[0]["bindings"][0]["commands"][0], "fmt-pass");
}

#[test]
fn dispatch_rejects_unknown_events() {
    let temp = TempDir::new().unwrap();
    let settings = write_settings(temp.path(), "{}");

    let output = run_gatehouse_with_stdin(&settings, &["hook", "dispatch", "session-start"], "{}");
    assert_ne!(output.status.code(), Some(0));
}
