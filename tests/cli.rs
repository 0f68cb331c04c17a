//! Integration tests for the logtriage CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn logtriage(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("logtriage").unwrap();
    // Keep user and project config files out of the picture
    cmd.current_dir(cwd).env("HOME", cwd);
    cmd
}

fn fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let write = |rel: &str, content: &str| {
        let path = temp_dir.path().join("logs").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    };
    write(
        "max/alu-fast-ID1/simulate.log",
        "UVM_ERROR @ 10: Mismatch at 0x10\nUVM_WARNING @ 11: slow, very slow\n",
    );
    write("max/alu-fast-ID2/simulate.log", "UVM_ERROR @ 99: Mismatch at 0xFF\n");
    write("max/alu-fast-ID2/compile.log", "Error-[SE] Syntax error\n");
    temp_dir
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    logtriage(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulator log"));
}

#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    logtriage(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("logtriage"));
}

#[test]
fn test_scan_json_output() {
    let temp_dir = fixture();
    let report = json_stdout(logtriage(temp_dir.path()).args(["scan", "logs", "--format", "json"]));

    assert_eq!(report["status"], "completed");
    assert_eq!(report["totals"]["error"], 3);
    assert_eq!(report["totals"]["warning"], 1);

    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows[0]["message"], "Mismatch at 0xVAL");
    assert_eq!(rows[0]["count"], 2);
    assert_eq!(rows[0]["testcase"], "alu");
    assert_eq!(rows[0]["logtype"], "simulate");
}

#[test]
fn test_scan_csv_output() {
    let temp_dir = fixture();
    logtriage(temp_dir.path())
        .args(["scan", "logs", "--format", "csv", "--severity", "warning"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "id,testcase,testopt,type,count,message,orig_message,logtype,logfilepath,linenumber\n",
        ))
        .stdout(predicate::str::contains("\"slow, very slow\""))
        .stdout(predicate::str::contains("UVM_ERROR").not());
}

#[test]
fn test_scan_filters_and_kind_switches() {
    let temp_dir = fixture();
    let report = json_stdout(logtriage(temp_dir.path()).args([
        "scan",
        "logs",
        "--format",
        "json",
        "--no-compile",
        "--count",
        ">1",
    ]));

    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["type"], "ERROR");
    assert_eq!(report["stats"]["files_total"], 2);
}

#[test]
fn test_scan_summary_csv() {
    let temp_dir = fixture();
    logtriage(temp_dir.path())
        .args(["scan", "logs", "--summary", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("testcase,testopt,error,error_unique"))
        .stdout(predicate::str::contains("alu,fast,3,2,0,0,1,1,true,true"));
}

#[test]
fn test_scan_missing_root_exits_with_failure_status() {
    let temp_dir = TempDir::new().unwrap();
    logtriage(temp_dir.path())
        .args(["scan", "does-not-exist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Scan failed"));
}

#[test]
fn test_scan_rejects_malformed_count_filter() {
    let temp_dir = fixture();
    logtriage(temp_dir.path())
        .args(["scan", "logs", "--count", ">x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid count filter"));
}

#[test]
fn test_rules_list_builtin() {
    let temp_dir = TempDir::new().unwrap();
    logtriage(temp_dir.path())
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  1. ERROR    UVM_ERROR"));
}

#[test]
fn test_rules_check_reports_invalid_pattern() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("rules.json"),
        r#"[{"Type": "ERROR", "Regex": "UVM_ERROR"}, {"Type": "ERROR", "Regex": "(unclosed"}]"#,
    )
    .unwrap();

    logtriage(temp_dir.path())
        .args(["rules", "check", "--rules", "rules.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid classification rules in rules.json"));
}

#[test]
fn test_rules_check_accepts_valid_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("rules.yaml"),
        "- Type: WARNING\n  Regex: '^\\*\\* Warning:'\n- [ERROR, '^\\*\\* Error']\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("ignore.json"), r#"["something happened"]"#).unwrap();

    logtriage(temp_dir.path())
        .args(["-v", "rules", "check", "--rules", "rules.yaml", "--ignore", "ignore.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 classification rules"))
        .stderr(predicate::str::contains("ignore: something happened"));
}

#[test]
fn test_config_show_uses_project_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("logtriage.toml"), "[scan]\nworkers = 5\n").unwrap();

    let config = json_stdout(logtriage(temp_dir.path()).args(["config", "show", "--format", "json"]));
    assert_eq!(config["scan"]["workers"], 5);
    assert_eq!(config["identity"]["anchor"], "max");
}
