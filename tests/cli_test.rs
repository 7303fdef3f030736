//! CLI integration tests for the sqlident binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper: get a Command for the sqlident binary.
fn sqlident() -> Command {
    let mut cmd = Command::cargo_bin("sqlident").expect("binary should exist");
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

/// Helper: create a temp directory holding the given files.
fn setup_temp_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
    dir
}

// ─── stdin ───

#[test]
fn test_stdin_human_output() {
    sqlident()
        .arg("-")
        .write_stdin("SELECT 1; DELETE FROM t")
        .assert()
        .success()
        .stdout("0-8 SELECT (LISTING)\n10-22 DELETE (MODIFICATION)\n");
}

#[test]
fn test_stdin_json_output() {
    let output = sqlident()
        .args(["--format", "json", "-"])
        .write_stdin("SELECT * FROM t WHERE a = ?")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["start"], 0);
    assert_eq!(json[0]["end"], 26);
    assert_eq!(json[0]["type"], "SELECT");
    assert_eq!(json[0]["executionType"], "LISTING");
    assert_eq!(json[0]["parameters"][0], "?");
    assert_eq!(json[0]["text"], "SELECT * FROM t WHERE a = ?");
}

#[test]
fn test_stdin_empty_input() {
    sqlident()
        .arg("-")
        .write_stdin("\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_stdin_strict_error_exits_with_code_2() {
    sqlident()
        .arg("-")
        .write_stdin("VACUUM;")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid statement parser \"VACUUM\""));
}

#[test]
fn test_stdin_no_strict() {
    sqlident()
        .args(["--no-strict", "-"])
        .write_stdin("VACUUM;")
        .assert()
        .success()
        .stdout("0-6 UNKNOWN (UNKNOWN)\n");
}

#[test]
fn test_dialect_flag() {
    sqlident()
        .args(["--dialect", "psql", "-"])
        .write_stdin("SELECT $2, $1")
        .assert()
        .success()
        .stdout("0-12 SELECT (LISTING) params=[$1, $2]\n");
}

#[test]
fn test_invalid_dialect_flag() {
    sqlident()
        .args(["--dialect", "db2", "-"])
        .write_stdin("SELECT 1")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown dialect \"db2\""));
}

#[test]
fn test_parameter_flags() {
    sqlident()
        .args(["--named", ":", "--custom", r"\{\w+\}", "-"])
        .write_stdin("SELECT :a, {b}, ?")
        .assert()
        .success()
        .stdout("0-16 SELECT (LISTING) params=[:a, {b}]\n");
}

#[test]
fn test_tables_flag() {
    sqlident()
        .args(["--tables", "-"])
        .write_stdin("SELECT * FROM a JOIN b ON a.x = b.x")
        .assert()
        .success()
        .stdout(predicate::str::contains("tables=[a, b]"));
}

#[test]
fn test_invalid_format() {
    sqlident()
        .args(["--format", "yaml", "-"])
        .write_stdin("SELECT 1")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown output format"));
}

// ─── files and directories ───

#[test]
fn test_directory_run() {
    let dir = setup_temp_dir(&[
        ("a.sql", "SELECT 1;"),
        ("nested/b.ddl", "CREATE TABLE t (id int);"),
        ("notes.txt", "SELECT 1;"),
    ]);
    sqlident()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("a.sql"))
        .stdout(predicate::str::contains("0-8 SELECT (LISTING)"))
        .stdout(predicate::str::contains("0-23 CREATE_TABLE (MODIFICATION)"))
        .stdout(predicate::str::contains("notes.txt").not())
        .stderr(predicate::str::contains(
            "2 file(s) processed, 2 statement(s) identified",
        ));
}

#[test]
fn test_error_file_exits_with_code_2() {
    let dir = setup_temp_dir(&[("good.sql", "SELECT 1;"), ("bad.sql", "LIST things;")]);
    sqlident()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("bad.sql"))
        .stderr(predicate::str::contains("Invalid statement parser \"LIST\""))
        .stderr(predicate::str::contains("1 error(s)"));
}

#[test]
fn test_hidden_and_excluded_paths_skipped() {
    let dir = setup_temp_dir(&[
        ("keep.sql", "SELECT 1;"),
        (".hidden/skip.sql", "LIST things;"),
        ("vendor/skip.sql", "LIST things;"),
    ]);
    sqlident()
        .args(["--exclude", "vendor"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 file(s) processed"));
}

#[test]
fn test_quiet_mode() {
    let dir = setup_temp_dir(&[("a.sql", "SELECT 1;")]);
    sqlident()
        .arg("--quiet")
        .arg(dir.path())
        .assert()
        .success()
        .stdout("")
        .stderr("");
}

#[test]
fn test_directory_json_output() {
    let dir = setup_temp_dir(&[("a.sql", "SELECT 1;"), ("b.sql", "LIST 1;")]);
    let output = sqlident()
        .args(["--format", "json", "--quiet"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["status"], "identified");
    assert_eq!(json[0]["statements"][0]["type"], "SELECT");
    assert_eq!(json[1]["status"], "error");
    assert_eq!(json[1]["statements"].as_array().unwrap().len(), 0);
}

// ─── configuration ───

#[test]
fn test_config_file_discovered() {
    let dir = setup_temp_dir(&[
        ("sqlident.toml", "dialect = \"mysql\"\nidentify_tables = true\n"),
        ("queries/show.sql", "SHOW TABLES; SELECT * FROM users;"),
    ]);
    sqlident()
        .arg(dir.path().join("queries"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0-11 SHOW_TABLES (LISTING)"))
        .stdout(predicate::str::contains("tables=[users]"));
}

#[test]
fn test_flags_override_config() {
    let dir = setup_temp_dir(&[
        ("sqlident.toml", "dialect = \"mysql\"\n"),
        ("show.sql", "SHOW TABLES;"),
    ]);
    sqlident()
        .args(["--dialect", "psql"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid statement parser \"SHOW\""));
}

#[test]
fn test_unknown_config_key() {
    let dir = setup_temp_dir(&[
        ("sqlident.toml", "line_length = 88\n"),
        ("a.sql", "SELECT 1;"),
    ]);
    sqlident()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown config option: line_length"));
}

#[test]
fn test_explicit_config_missing() {
    let dir = setup_temp_dir(&[("a.sql", "SELECT 1;")]);
    sqlident()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_explicit_config_parameters() {
    let dir = setup_temp_dir(&[
        ("custom.toml", "[parameters]\nnamed = [\"@\"]\n"),
        ("a.sql", "SELECT @who, ?;"),
    ]);
    sqlident()
        .arg("--config")
        .arg(dir.path().join("custom.toml"))
        .arg(dir.path().join("a.sql"))
        .assert()
        .success()
        .stdout(predicate::str::contains("params=[@who]"));
}
