//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("SUBMIX_SCORER")
        .env_remove("SUBMIX_SCORER_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Two small submissions that share both ids.
fn cat_dog(dir: &Path) {
    fs::write(
        dir.join("a_submission.csv"),
        "id,text\n1,the cat sat\n2,the dog ran\n",
    )
    .unwrap();
    fs::write(
        dir.join("b_submission.csv"),
        "id,text\n1,the cat sat\n2,a dog ran\n",
    )
    .unwrap();
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn long_help_lists_environment_variables() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUBMIX_SCORER_URL"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let tmp = TempDir::new().unwrap();
    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info", "--json"])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["config"]["scorer"], "local");
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["-q", "info"]).assert().success();
}

#[test]
fn verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}

// =============================================================================
// Stats Command
// =============================================================================

#[test]
fn stats_json_reports_each_file() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    let output = cmd()
        .current_dir(tmp.path())
        .args(["stats", "--json", "a_submission.csv", "b_submission.csv"])
        .output()
        .unwrap();
    let json = stdout_json(&output);

    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["name"], "a_submission.csv");
    assert_eq!(files[0]["row_count"], 2);
    assert_eq!(files[0]["avg_word_count"], 3.0);
    assert_eq!(json["common_id_count"], 2);
}

#[test]
fn stats_expands_directories() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    fs::write(tmp.path().join("notes.csv"), "id,text\n9,ignored\n").unwrap();

    let output = cmd()
        .args(["stats", "--json", tmp.path().to_str().unwrap()])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
}

#[test]
fn stats_warns_about_invalid_files() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    fs::write(tmp.path().join("bad_submission.csv"), "id,body\n1,x\n").unwrap();

    cmd()
        .current_dir(tmp.path())
        .args(["stats", "a_submission.csv", "bad_submission.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("bad_submission.csv"))
        .stdout(predicate::str::contains("a_submission.csv"));
}

#[test]
fn stats_fails_when_nothing_is_valid() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad_submission.csv"), "key,value\n1,x\n").unwrap();
    cmd()
        .current_dir(tmp.path())
        .args(["stats", "bad_submission.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid submission files"));
}

// =============================================================================
// Compare Command
// =============================================================================

#[test]
fn compare_lists_differing_rows() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    cmd()
        .current_dir(tmp.path())
        .args(["--color", "never", "compare", "a_submission.csv", "b_submission.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a dog ran"))
        .stdout(predicate::str::contains("the cat sat").not());
}

#[test]
fn compare_json_counts() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    let output = cmd()
        .current_dir(tmp.path())
        .args(["compare", "--json", "--all-rows", "a_submission.csv", "b_submission.csv"])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["rows"].as_array().unwrap().len(), 2);
    assert_eq!(json["different_text_count"], 1);
    assert_eq!(json["same_words_count"], 1);
    assert_eq!(json["rows"][1]["texts_different"], true);
}

#[test]
fn compare_json_keeps_identical_rows() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    let output = cmd()
        .current_dir(tmp.path())
        .args(["compare", "--json", "a_submission.csv", "b_submission.csv"])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["texts_different"], false);
    assert_eq!(json["different_text_count"], 1);
}

#[test]
fn compare_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    cmd()
        .current_dir(tmp.path())
        .args(["compare", "a_submission.csv", "missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.csv"));
}

// =============================================================================
// Score Command
// =============================================================================

#[test]
fn score_prints_value_in_local_range() {
    let output = cmd().args(["score", "the cat sat on the mat"]).output().unwrap();
    assert!(output.status.success());
    let value: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert!((5.0..=30.0).contains(&value));
}

#[test]
fn score_reads_stdin() {
    let output = cmd()
        .args(["score", "--json", "-"])
        .write_stdin("repeat repeat repeat")
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["source"], "local");
    assert_eq!(json["strategy"], "local");
}

#[test]
fn score_falls_back_when_remote_is_down() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let output = cmd()
        .args([
            "score",
            "--json",
            "--scorer-url",
            &format!("http://127.0.0.1:{port}"),
            "--timeout",
            "2",
            "hello world",
        ])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["strategy"], "remote");
    assert_eq!(json["source"], "fallback");
}

// =============================================================================
// Analyze Command
// =============================================================================

#[test]
fn analyze_json_report() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    let output = cmd()
        .current_dir(tmp.path())
        .args(["analyze", "--json", "."])
        .output()
        .unwrap();
    let json = stdout_json(&output);

    assert_eq!(json["file_stats"].as_array().unwrap().len(), 2);
    assert_eq!(json["common_id_count"], 2);
    assert_eq!(json["total_unique_id_count"], 2);
    assert_eq!(json["comparison"]["different_text_count"], 1);
    assert_eq!(json["best_records"].as_array().unwrap().len(), 2);
    let histogram = json["perplexity_reports"][0]["histogram"].as_array().unwrap();
    assert_eq!(histogram.len(), 10);
    assert_eq!(json["scoring"]["strategy"], "local");
}

#[test]
fn analyze_writes_ensemble_file() {
    let tmp = TempDir::new().unwrap();
    cat_dog(tmp.path());
    cmd()
        .current_dir(tmp.path())
        .args([
            "--color",
            "never",
            "analyze",
            "a_submission.csv",
            "b_submission.csv",
            "--output",
            "best.csv",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ensemble written to"));

    let written = fs::read_to_string(tmp.path().join("best.csv")).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("id,text"));
    assert_eq!(lines.count(), 2);
}

#[test]
fn analyze_with_no_valid_files_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("x_submission.csv"), "key,value\n1,x\n").unwrap();
    cmd()
        .current_dir(tmp.path())
        .args(["analyze", "x_submission.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no datasets selected"));
}

#[test]
fn analyze_empty_directory_fails() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn analyze_requires_an_input() {
    cmd().arg("analyze").assert().failure();
}

// =============================================================================
// Doctor Command
// =============================================================================

#[test]
fn doctor_offline_json() {
    let tmp = TempDir::new().unwrap();
    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "doctor", "--offline", "--json"])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["scorer"]["status"], "skipped");
    assert_eq!(json["scorer"]["strategy"], "local");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_scorer_value_is_rejected() {
    cmd()
        .args(["score", "--scorer", "oracle", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("oracle"));
}
