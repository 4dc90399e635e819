// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that drive the `asqlite3` binary.
//!
//! Each test writes its own config file and database into a temp directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("main.db");
        std::fs::write(
            dir.path().join("asqlite3.toml"),
            format!(
                "[connection]\ndatabase = {:?}\n\n[logging]\nlevel = \"warn\"\n",
                db.to_string_lossy()
            ),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_asqlite3"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("asqlite3.toml"))
            .args(args)
            .output()
            .unwrap()
    }

    fn stdout(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert!(
            out.status.success(),
            "asqlite3 {args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8(out.stdout).unwrap()
    }
}

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

// ---- Query and script ----

#[test]
fn test_script_then_query() {
    let ws = Workspace::new();
    let script = ws.path("init.sql");
    write(&script, "CREATE TABLE t(a, b); INSERT INTO t VALUES (1, 'one'), (2, 'two');");

    ws.stdout(&["script", script.to_str().unwrap()]);
    let out = ws.stdout(&["query", "SELECT a, b FROM t ORDER BY a", "--header"]);
    assert_eq!(out, "a\tb\n1\tone\n2\ttwo\n");

    let out = ws.stdout(&["query", "SELECT b FROM t WHERE a = :a", "-n", "a=2"]);
    assert_eq!(out, "two\n");
}

#[test]
fn test_query_write_persists_with_isolation_level() {
    let ws = Workspace::new();
    let db = ws.path("main.db");
    write(
        &ws.path("asqlite3.toml"),
        &format!(
            "[connection]\ndatabase = {:?}\nisolation_level = \"DEFERRED\"\n",
            db.to_string_lossy()
        ),
    );

    ws.stdout(&["query", "CREATE TABLE t(x)"]);
    ws.stdout(&["query", "INSERT INTO t VALUES (1)"]);
    let out = ws.stdout(&["query", "SELECT COUNT(*) FROM t"]);
    assert_eq!(out, "1\n");
}

#[test]
fn test_sql_error_exits_nonzero() {
    let ws = Workspace::new();
    let out = ws.run(&["query", "SELEC 1"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("asqlite3:"));
}

#[test]
fn test_invalid_config_is_reported() {
    let ws = Workspace::new();
    write(&ws.path("asqlite3.toml"), "[connection]\ndatabse = \"x.db\"\n");
    let out = ws.run(&["query", "SELECT 1"]);
    assert!(!out.status.success());
}

// ---- Dump, backup, restore ----

#[test]
fn test_dump_backup_and_restore() {
    let ws = Workspace::new();
    let script = ws.path("init.sql");
    write(&script, "CREATE TABLE t(x); INSERT INTO t VALUES ('kept');");
    ws.stdout(&["script", script.to_str().unwrap()]);

    let dump = ws.stdout(&["dump"]);
    assert!(dump.contains("INSERT INTO \"t\" VALUES('kept');"));

    let copy = ws.path("copy.db");
    ws.stdout(&["backup", copy.to_str().unwrap()]);
    assert!(copy.exists());

    let other = ws.path("other.db");
    let other_db = other.to_str().unwrap();
    ws.stdout(&["-d", other_db, "restore", copy.to_str().unwrap()]);
    let out = ws.stdout(&["-d", other_db, "query", "SELECT x FROM t"]);
    assert_eq!(out, "kept\n");
}
