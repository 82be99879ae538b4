use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_path(name: &str) -> String {
    workspace_root()
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_roster-import"))
        .args(args)
        .output()
        .expect("failed to run roster-import CLI")
}

fn run_cli_with_stdin(args: &[&str], input: &[u8]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_roster-import"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn roster-import CLI");
    // The CLI may exit before reading stdin on usage errors.
    let _ = child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input);
    child
        .wait_with_output()
        .expect("failed to wait for roster-import CLI")
}

#[test]
fn cli_prints_single_name_field() {
    let path = fixture_path("2k_kb.rosz");
    let output = run_cli(&["--name", &path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "name=2k KB");
}

#[test]
fn cli_prints_multiple_requested_fields_in_fixed_order() {
    let path = fixture_path("2k_kb.json");
    let output = run_cli(&["--revision", "--points", "--faction", "--game-system", &path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "faction=Kruleboyz",
            "game_system=Age of Sigmar 4.0",
            "points=1930",
            "revision=12",
        ]
    );
}

#[test]
fn cli_units_field_lists_every_unit() {
    let path = fixture_path("2k_kb.ros");
    let output = run_cli(&["--units", &path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 12);
    assert!(lines.iter().all(|line| line.starts_with("unit=")));
    assert_eq!(lines[1], "unit=1x Breaka-boss on Mirebrute Troggoth (200 pts)");
}

#[test]
fn cli_default_output_is_summary_sheet() {
    let path = fixture_path("2k_kb.rosz");
    let output = run_cli(&[&path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Kruleboyz  ::  Age of Sigmar 4.0"));
    assert!(stdout.contains(" ::: Units :::"));
    assert!(stdout.contains("Skaregob Totem"));
}

#[test]
fn cli_json_matches_across_formats() {
    let mut documents = Vec::new();
    for name in ["2k_kb.rosz", "2k_kb.ros", "2k_kb.json"] {
        let path = fixture_path(name);
        let output = run_cli(&["--json", &path]);
        assert!(output.status.success(), "{name} should decode");
        let mut json: Value =
            serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
        json.as_object_mut()
            .expect("json should be an object")
            .remove("format");
        documents.push(json);
    }

    assert_eq!(documents[0], documents[1]);
    assert_eq!(documents[1], documents[2]);
    assert_eq!(documents[0]["listName"], "2k KB");
    assert_eq!(documents[0]["totalPoints"], 1930);
}

#[test]
fn cli_json_with_fields_prints_subset() {
    let path = fixture_path("2k_kb.json");
    let output = run_cli(&["--json", "--generator", "--name", &path]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    let object = json.as_object().expect("json should be an object");
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["listName", "generator"]);
    assert_eq!(json["generator"], "https://newrecruit.eu");
}

#[test]
fn cli_reads_stdin_with_explicit_format() {
    let bytes = std::fs::read(fixture_path("2k_kb.ros")).expect("fixture should be readable");
    let output = run_cli_with_stdin(&["--format", "ros", "--name", "-"], &bytes);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "name=2k KB");
}

#[test]
fn cli_stdin_without_format_is_usage_error() {
    let output = run_cli_with_stdin(&["-"], b"{}");
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--format"));
}

#[test]
fn cli_format_flag_overrides_extension() {
    let source = std::fs::read(fixture_path("2k_kb.json")).expect("fixture should be readable");
    let dir = std::env::temp_dir().join(format!("roster_import_cli_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("pasted.txt");
    std::fs::write(&path, source).expect("failed to write temp file");
    let path = path.to_string_lossy().to_string();

    let output = run_cli(&["--points", &path]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("UnsupportedFormat"), "{stderr}");

    let output = run_cli(&["--format", "json", "--points", &path]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "points=1930");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cli_reports_decode_errors_with_exit_code_one() {
    let path = fixture_path("2k_kb.rosz");
    let output = run_cli(&["--format", "json", &path]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("JsonSyntax"), "{stderr}");
    assert!(stderr.contains("at line"), "{stderr}");
}

#[test]
fn cli_missing_file_exits_with_one() {
    let path = fixture_path("does_not_exist.rosz");
    let output = run_cli(&[&path]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_lists_formats() {
    let output = run_cli(&["--list-formats"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let extensions: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(extensions, vec![".rosz", ".ros", ".json"]);
}

#[test]
fn cli_without_file_is_usage_error() {
    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(2));
}
