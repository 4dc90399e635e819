// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `asqlite3 backup` and `asqlite3 restore` command implementation.
//!
//! Both directions use the engine's online backup, so the copy is consistent
//! even while other connections write to the source.

use std::path::Path;
use std::time::Duration;

use asqlite3::{AsqliteError, BackupOptions, ConnectConfig, Connection, Progress};
use tracing::debug;

/// Copy 100 pages per step, sleeping 10ms between steps.
fn step_options() -> BackupOptions {
    BackupOptions {
        pages: 100,
        sleep: Duration::from_millis(10),
        progress: Some(Box::new(|p: Progress| {
            debug!(remaining = p.remaining, total = p.pagecount, "backup step");
        })),
    }
}

/// Copy the open database into the file at `target`.
pub async fn run_backup(conn: &Connection, target: &Path) -> Result<(), AsqliteError> {
    let dst = asqlite3::connect(target.to_string_lossy()).await?;
    dst.scope(|dst| async move { conn.backup(&dst, step_options()).await })
        .await?;

    let size = std::fs::metadata(target).map(|m| m.len()).unwrap_or(0);
    let size_mb = size as f64 / (1024.0 * 1024.0);
    eprintln!("Backup complete: {size_mb:.1} MB written to {}", target.display());
    Ok(())
}

/// Replace the open database's contents with the database file at `source`.
pub async fn run_restore(conn: &Connection, source: &Path) -> Result<(), AsqliteError> {
    if !source.exists() {
        return Err(AsqliteError::Usage(format!(
            "backup file not found: {}",
            source.display()
        )));
    }
    let src = asqlite3::connect_with(ConnectConfig {
        read_only: true,
        ..ConnectConfig::new(source.to_string_lossy())
    })
    .await?;
    src.scope(|src| async move { src.backup(conn, step_options()).await })
        .await?;
    eprintln!("Restore complete from {}", source.display());
    Ok(())
}
