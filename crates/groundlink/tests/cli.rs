#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn groundlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_groundlink"))
        .args(args)
        .output()
        .expect("groundlink should run")
}

fn groundlink_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_groundlink"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("groundlink should spawn");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes())
        .expect("stdin should accept input");
    child.wait_with_output().expect("groundlink should exit")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "groundlink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn catalog_lists_reference_variables() {
    let output = groundlink(&["catalog", "--format", "json"]);
    assert!(output.status.success());

    let entries = json_lines(&output);
    assert_eq!(entries.len(), 1);
    let soft_kill = entries[0]
        .as_array()
        .expect("catalog should be an array")
        .iter()
        .find(|entry| entry["group"] == "switches" && entry["name"] == "softKill")
        .expect("softKill should be listed");
    assert_eq!(soft_kill["tag"], 43);
    assert_eq!(soft_kill["zero_value"], false);
}

#[test]
fn catalog_unknown_group_is_usage_error() {
    let output = groundlink(&["catalog", "--group", "nope", "--format", "json"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown group 'nope'"));
}

#[test]
fn catalog_from_file() {
    let dir = unique_temp_dir("catalog");
    let path = dir.join("rover.json");
    std::fs::write(&path, r#"{"rover": {"speed": 0.0, "armed": false}}"#)
        .expect("catalog should be writable");

    let output = groundlink(&[
        "encode",
        "rover.armed",
        "true",
        "--catalog",
        path.to_str().expect("utf-8 path"),
        "--format",
        "json",
    ]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["variable"], "rover.armed");
    assert_eq!(lines[0]["tag"], 0);
    assert_eq!(lines[0]["value"], true);
}

#[test]
fn encode_prints_frame() {
    let output = groundlink(&["encode", "switches.softKill", "true", "--format", "json"]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["variable"], "switches.softKill");
    assert_eq!(lines[0]["tag"], 43);
    assert_eq!(lines[0]["query"], false);
    assert_eq!(lines[0]["frame"], "04082b2001");

    let pretty = groundlink(&["encode", "switches.softKill", "true", "--format", "pretty"]);
    assert!(String::from_utf8_lossy(&pretty.stdout).contains("=> 04082b2001"));
}

#[test]
fn encode_query_has_no_value() {
    let output = groundlink(&["encode", "switches.softKill", "--format", "json"]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines[0]["query"], true);
    assert!(lines[0].get("value").is_none());
    assert_eq!(lines[0]["frame"], "02082b");
}

#[test]
fn encode_rejects_unknown_variable_and_bad_kind() {
    let unknown = groundlink(&["encode", "bogus.var", "1"]);
    assert_eq!(unknown.status.code(), Some(64));

    let mismatched = groundlink(&["encode", "led.pattern", "1.5"]);
    assert_eq!(mismatched.status.code(), Some(60));

    let malformed = groundlink(&["encode", "softKill", "true"]);
    assert_eq!(malformed.status.code(), Some(64));
}

#[test]
fn decode_reports_updates_and_errors() {
    let output = groundlink(&["decode", "04082b2001", "--format", "json"]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["variable"], "switches.softKill");
    assert_eq!(lines[0]["value"], true);

    // Second frame declares 9 payload bytes with only 1 remaining.
    let truncated = groundlink(&["decode", "04082b2001 0900", "--format", "json"]);
    assert_eq!(truncated.status.code(), Some(60));
    let lines = json_lines(&truncated);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["tag"], 43);
    assert!(lines[1]["error"]
        .as_str()
        .expect("error should be a string")
        .contains("declares 9"));
}

#[test]
fn decode_rejects_bad_hex() {
    let output = groundlink(&["decode", "0g"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn run_without_links_is_usage_error() {
    let output = groundlink_with_stdin(&["run"], "");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn run_drops_commands_while_no_link_is_up() {
    let output = groundlink_with_stdin(
        &[
            "run",
            "--serial",
            "/nonexistent/groundlink-test",
            "--retry",
            "20ms",
            "--format",
            "pretty",
        ],
        "k\nbogus.var 1\n\n",
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bogus.var"), "stderr: {stderr}");
}

#[test]
fn run_rejects_bad_retry() {
    let output = groundlink_with_stdin(
        &["run", "--serial", "/dev/null", "--retry", "soon"],
        "",
    );
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = groundlink(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("groundlink {}", env!("CARGO_PKG_VERSION"))
    );
}
