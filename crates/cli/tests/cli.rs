//! CLI integration tests.
//!
//! Every test runs the `tagscript` binary inside its own temporary
//! directory, so the default `input.tag` / `output.json` paths are isolated.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SCRIPT: &str = "\
TASK: summarize
ACTION: read file
GOAL: short summary
@file:\"/tmp/a.txt\" { permission: \"read\" }
IF score > 10 THEN
flag it
END
";

fn tagscript(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("tagscript");
    cmd.current_dir(dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn workspace_with(name: &str, contents: &[u8]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join(name), contents).expect("write input");
    dir
}

// ──────────────────────────────────────────────
// Conversion
// ──────────────────────────────────────────────

#[test]
fn converts_default_input_to_default_output() {
    let dir = workspace_with("input.tag", SCRIPT.as_bytes());

    tagscript(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsed input.tag"))
        .stderr(predicate::str::contains("llm_references: 1"))
        .stderr(predicate::str::contains("Wrote output.json"));

    let written = fs::read_to_string(dir.path().join("output.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["task"][0], "summarize");
    assert_eq!(json["llm_references"][0]["path"], "/tmp/a.txt");
    assert_eq!(json["if_blocks"][0]["then"], "flag it\n");
    // pretty by default
    assert!(written.contains("\n  \"task\""));
}

#[test]
fn writes_to_named_output() {
    let dir = workspace_with("script.tag", SCRIPT.as_bytes());

    tagscript(&dir)
        .args(["script.tag", "-o", "out/doc.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("I/O error for 'out/doc.json'"));

    fs::create_dir(dir.path().join("out")).unwrap();
    tagscript(&dir)
        .args(["script.tag", "--output", "out/doc.json"])
        .assert()
        .success();
    assert!(dir.path().join("out/doc.json").exists());
}

#[test]
fn stdout_compact_prints_one_line() {
    let dir = workspace_with("input.tag", SCRIPT.as_bytes());

    let output = tagscript(&dir)
        .args(["--stdout", "--compact"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.trim_end().lines().count(), 1);
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["goal"][0], "short summary");
    assert!(!dir.path().join("output.json").exists());
}

// ──────────────────────────────────────────────
// Input errors
// ──────────────────────────────────────────────

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();

    tagscript(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input file not found: input.tag"));
}

#[test]
fn undecodable_input_fails_until_encoding_given() {
    let dir = workspace_with("input.tag", b"TASK: caf\xE9\n");

    tagscript(&dir)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not decode input.tag as utf-8"));

    tagscript(&dir)
        .args(["--stdout", "--encoding", "latin-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("caf\u{e9}"));
}

#[test]
fn unsupported_encoding_fails() {
    let dir = workspace_with("input.tag", SCRIPT.as_bytes());

    tagscript(&dir)
        .args(["--encoding", "klingon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported encoding: klingon"));
}

// ──────────────────────────────────────────────
// Parser options
// ──────────────────────────────────────────────

#[test]
fn strict_mode_fails_on_malformed_line() {
    let dir = workspace_with("input.tag", b"TASK: t\nIF ready\n");

    tagscript(&dir)
        .args(["--stdout", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse failure at line 2"));

    tagscript(&dir).arg("--stdout").assert().success();
}

#[test]
fn legacy_operators_flag_changes_condition_split() {
    let dir = workspace_with("input.tag", b"IF a >= 5 THEN\nEND\n");

    tagscript(&dir)
        .args(["--stdout", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""left":"a","operator":">=""#));

    tagscript(&dir)
        .args(["--stdout", "--compact", "--legacy-operators"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""left":"a >","operator":"=""#));
}

#[test]
fn legacy_mappings_flag_changes_parameter_split() {
    let dir = workspace_with("input.tag", b"@tool:x { tags: [a, b], n: 1 }\n");

    tagscript(&dir)
        .args(["--stdout", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""tags":["a","b"]"#));

    tagscript(&dir)
        .args(["--stdout", "--compact", "--legacy-mappings"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""tags":"[a""#));
}

// ──────────────────────────────────────────────
// Validation
// ──────────────────────────────────────────────

#[test]
fn validate_fails_on_missing_tags() {
    let dir = workspace_with("input.tag", b"TASK: only a task\n");

    tagscript(&dir)
        .args(["--stdout", "--validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing ACTION"))
        .stderr(predicate::str::contains("Missing GOAL"))
        .stderr(predicate::str::contains("validation failed with 2 error(s)"));
}

#[test]
fn validate_passes_complete_script() {
    let dir = workspace_with("input.tag", SCRIPT.as_bytes());

    tagscript(&dir)
        .args(["--stdout", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"task\""));
}
