//! CLI end-to-end tests
//!
//! Tests for the tabula command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the tabula binary
#[allow(deprecated)]
fn tabula_cmd() -> Command {
    Command::cargo_bin("tabula").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = tabula_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = tabula_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tabula"));
}

#[test]
fn test_cli_demo_prints_each_stage() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("demo.db");

    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["demo", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Select everything:"))
        .stdout(predicate::str::contains(
            "users(id=1, name='Ala', email='alice@gmail.com')",
        ))
        .stdout(predicate::str::contains("After undoing the delete:"));

    assert!(db.exists());
}

#[test]
fn test_cli_demo_json() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("demo.db");

    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["demo", "--json", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"name":"Ewa"}"#));
}

#[test]
fn test_cli_migrate_once() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("migrate.db");
    let sql = dir.path().join("001.sql");
    fs::write(&sql, "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT);").unwrap();

    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["migrate", "001_posts"])
        .arg(&sql)
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 001_posts"));

    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["migrate", "001_posts"])
        .arg(&sql)
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("already applied"));

    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["migrations", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("001_posts"));

    let conn = rusqlite::Connection::open(&db).unwrap();
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='posts'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn test_cli_migrate_missing_file() {
    let dir = tempdir().unwrap();
    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["migrate", "001", "nope.sql", "--database", "x.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read migration file"));
}

#[test]
fn test_cli_config_file_location() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("tabula.toml");
    fs::write(
        &config,
        "[store]\nlocation = \"from_config.db\"\nmax_connections = 2\n",
    )
    .unwrap();

    let mut cmd = tabula_cmd();
    cmd.current_dir(dir.path())
        .args(["migrations", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No migrations applied"));

    assert!(dir.path().join("from_config.db").exists());
}

#[test]
fn test_cli_empty_location_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[store]\nlocation = \"\"\n").unwrap();

    let mut cmd = tabula_cmd();
    cmd.args(["migrations", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("location cannot be empty"));
}
