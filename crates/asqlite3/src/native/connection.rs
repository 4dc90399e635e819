// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native connection state: the `rusqlite` connection plus the engine-level
//! options this crate forwards (implicit transaction mode).

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use asqlite3_config::ConnectConfig;
use asqlite3_core::{AsqliteError, IsolationLevel};
use rusqlite::backup::{Backup, Progress, StepResult};
use rusqlite::{Connection, InterruptHandle, OpenFlags};

use crate::offload::lock_native;

pub(crate) struct RawConnection {
    conn: Option<Connection>,
    isolation_level: Option<IsolationLevel>,
}

impl RawConnection {
    /// Open the engine. Blocking; call from a worker thread.
    pub(crate) fn open(config: &ConnectConfig) -> Result<(Self, InterruptHandle), AsqliteError> {
        let conn = Connection::open_with_flags(&config.database, open_flags(config))?;
        conn.busy_timeout(config.timeout())?;
        conn.set_prepared_statement_cache_capacity(config.cached_statements);
        let interrupt = conn.get_interrupt_handle();
        Ok((
            Self {
                conn: Some(conn),
                isolation_level: config.isolation_level,
            },
            interrupt,
        ))
    }

    pub(crate) fn live(&self) -> Result<&Connection, AsqliteError> {
        self.conn.as_ref().ok_or(AsqliteError::ConnectionClosed)
    }

    pub(crate) fn live_mut(&mut self) -> Result<&mut Connection, AsqliteError> {
        self.conn.as_mut().ok_or(AsqliteError::ConnectionClosed)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    pub(crate) fn isolation_level(&self) -> Option<IsolationLevel> {
        self.isolation_level
    }

    /// Switching to autocommit commits any pending transaction first.
    pub(crate) fn set_isolation_level(
        &mut self,
        level: Option<IsolationLevel>,
    ) -> Result<(), AsqliteError> {
        if level.is_none() {
            self.commit()?;
        }
        self.isolation_level = level;
        Ok(())
    }

    pub(crate) fn in_transaction(&self) -> Result<bool, AsqliteError> {
        Ok(!self.live()?.is_autocommit())
    }

    pub(crate) fn total_changes(&self) -> Result<i64, AsqliteError> {
        let total = self
            .live()?
            .query_row("SELECT total_changes()", [], |row| row.get(0))?;
        Ok(total)
    }

    /// No-op when no transaction is open.
    pub(crate) fn commit(&self) -> Result<(), AsqliteError> {
        let conn = self.live()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// No-op when no transaction is open.
    pub(crate) fn rollback(&self) -> Result<(), AsqliteError> {
        let conn = self.live()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// Open an implicit transaction before a DML statement when an isolation
    /// level is set and the engine is in autocommit mode.
    pub(crate) fn begin_implicit(&self, sql: &str) -> Result<(), AsqliteError> {
        let Some(level) = self.isolation_level else {
            return Ok(());
        };
        let conn = self.live()?;
        if conn.is_autocommit() && is_dml(sql) {
            conn.execute_batch(level.begin_statement())?;
        }
        Ok(())
    }

    /// Commit a pending implicit transaction before running a script.
    pub(crate) fn commit_implicit(&self) -> Result<(), AsqliteError> {
        if self.isolation_level.is_some() {
            self.commit()?;
        }
        Ok(())
    }

    /// Release the engine handle. Closing an already closed connection is a no-op.
    pub(crate) fn close(&mut self) -> Result<(), AsqliteError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(conn, err)| {
                self.conn = Some(conn);
                AsqliteError::from(err)
            }),
            None => Ok(()),
        }
    }
}

/// Open flags for `config`. The engine's own per-connection mutex is always
/// disabled: callers are serialized by the connection family lock.
pub(crate) fn open_flags(config: &ConnectConfig) -> OpenFlags {
    let mut flags = if config.read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };
    if config.create && !config.read_only {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }
    if config.uri {
        flags |= OpenFlags::SQLITE_OPEN_URI;
    }
    flags.remove(OpenFlags::SQLITE_OPEN_FULL_MUTEX);
    flags | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

/// Options for [`Connection::backup`](crate::Connection::backup).
pub struct BackupOptions {
    /// Pages copied per step. Zero or negative copies everything in one step.
    pub pages: i32,
    /// Pause between steps.
    pub sleep: Duration,
    /// Called after every step with the remaining and total page counts.
    pub progress: Option<Box<dyn FnMut(Progress) + Send>>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            pages: -1,
            sleep: Duration::from_millis(250),
            progress: None,
        }
    }
}

impl fmt::Debug for BackupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupOptions")
            .field("pages", &self.pages)
            .field("sleep", &self.sleep)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Copy the whole `source` database into `target`. Blocking.
pub(crate) fn backup(
    source: &Arc<Mutex<RawConnection>>,
    target: &Arc<Mutex<RawConnection>>,
    options: &mut BackupOptions,
) -> Result<(), AsqliteError> {
    if Arc::ptr_eq(source, target) {
        return Err(AsqliteError::Usage(
            "cannot back up a connection onto itself".to_string(),
        ));
    }

    // Fixed lock order so opposite-direction backups cannot deadlock.
    let (src, mut dst) = if Arc::as_ptr(source) < Arc::as_ptr(target) {
        let src = lock_native(source)?;
        (src, lock_native(target)?)
    } else {
        let dst = lock_native(target)?;
        (lock_native(source)?, dst)
    };

    let backup = Backup::new(src.live()?, dst.live_mut()?)?;
    let pages = if options.pages <= 0 { -1 } else { options.pages };
    loop {
        let step = backup.step(pages)?;
        if let Some(progress) = options.progress.as_mut() {
            progress(backup.progress());
        }
        match step {
            StepResult::Done => return Ok(()),
            _ => thread::sleep(options.sleep),
        }
    }
}

/// Identity of a native engine connection.
///
/// Returned by [`Cursor::connection`](crate::Cursor::connection); compare with
/// [`Connection::engine`](crate::Connection::engine) via [`EngineConnection::same_as`].
#[derive(Clone)]
pub struct EngineConnection {
    raw: Arc<Mutex<RawConnection>>,
}

impl EngineConnection {
    pub(crate) fn new(raw: Arc<Mutex<RawConnection>>) -> Self {
        Self { raw }
    }

    pub(crate) fn raw(&self) -> &Arc<Mutex<RawConnection>> {
        &self.raw
    }

    pub fn same_as(&self, other: &EngineConnection) -> bool {
        Arc::ptr_eq(&self.raw, &other.raw)
    }
}

impl fmt::Debug for EngineConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EngineConnection")
            .field(&Arc::as_ptr(&self.raw))
            .finish()
    }
}

/// First keyword of `sql`, skipping leading whitespace and comments.
pub(crate) fn leading_keyword(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |i| &after[i + 1..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]);
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

pub(crate) fn is_dml(sql: &str) -> bool {
    let keyword = leading_keyword(sql);
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

pub(crate) fn is_insert(sql: &str) -> bool {
    let keyword = leading_keyword(sql);
    keyword.eq_ignore_ascii_case("INSERT") || keyword.eq_ignore_ascii_case("REPLACE")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_memory(level: Option<IsolationLevel>) -> RawConnection {
        let config = ConnectConfig {
            isolation_level: level,
            ..ConnectConfig::default()
        };
        RawConnection::open(&config).unwrap().0
    }

    #[test]
    fn flags_always_disable_engine_mutex() {
        let flags = open_flags(&ConnectConfig::default());
        assert!(flags.contains(OpenFlags::SQLITE_OPEN_NO_MUTEX));
        assert!(!flags.contains(OpenFlags::SQLITE_OPEN_FULL_MUTEX));
        assert!(flags.contains(OpenFlags::SQLITE_OPEN_CREATE));
        assert!(flags.contains(OpenFlags::SQLITE_OPEN_URI));
    }

    #[test]
    fn read_only_flags_never_create() {
        let config = ConnectConfig {
            read_only: true,
            ..ConnectConfig::new("x.db")
        };
        let flags = open_flags(&config);
        assert!(flags.contains(OpenFlags::SQLITE_OPEN_READ_ONLY));
        assert!(!flags.contains(OpenFlags::SQLITE_OPEN_CREATE));
        assert!(!flags.contains(OpenFlags::SQLITE_OPEN_READ_WRITE));
    }

    #[test]
    fn leading_keyword_skips_comments() {
        assert_eq!(leading_keyword("  insert into t values (1)"), "insert");
        assert_eq!(leading_keyword("-- note\n/* block */ UPDATE t SET x=1"), "UPDATE");
        assert_eq!(leading_keyword("SELECT(1)"), "SELECT");
        assert_eq!(leading_keyword("-- only a comment"), "");
        assert!(is_dml("replace into t values (1)"));
        assert!(!is_dml("SELECT 1"));
        assert!(is_insert("INSERT INTO t VALUES (1)"));
        assert!(!is_insert("DELETE FROM t"));
    }

    #[test]
    fn implicit_transaction_only_with_isolation_level() {
        let raw = open_memory(None);
        raw.live().unwrap().execute_batch("CREATE TABLE t(x)").unwrap();
        raw.begin_implicit("INSERT INTO t VALUES (1)").unwrap();
        assert!(!raw.in_transaction().unwrap());

        let raw = open_memory(Some(IsolationLevel::Deferred));
        raw.live().unwrap().execute_batch("CREATE TABLE t(x)").unwrap();
        raw.begin_implicit("SELECT 1").unwrap();
        assert!(!raw.in_transaction().unwrap());
        raw.begin_implicit("INSERT INTO t VALUES (1)").unwrap();
        assert!(raw.in_transaction().unwrap());
        raw.rollback().unwrap();
        assert!(!raw.in_transaction().unwrap());
    }

    #[test]
    fn clearing_isolation_level_commits() {
        let mut raw = open_memory(Some(IsolationLevel::Immediate));
        let conn = raw.live().unwrap();
        conn.execute_batch("CREATE TABLE t(x)").unwrap();
        raw.begin_implicit("INSERT INTO t VALUES (1)").unwrap();
        raw.live()
            .unwrap()
            .execute("INSERT INTO t VALUES (1)", [])
            .unwrap();
        raw.set_isolation_level(None).unwrap();
        assert!(!raw.in_transaction().unwrap());
        assert_eq!(raw.isolation_level(), None);
    }

    #[test]
    fn close_is_idempotent_and_fails_later_calls() {
        let mut raw = open_memory(None);
        raw.close().unwrap();
        assert!(raw.is_closed());
        raw.close().unwrap();
        assert!(matches!(raw.commit(), Err(AsqliteError::ConnectionClosed)));
    }

    #[test]
    fn backup_onto_itself_is_rejected() {
        let raw = Arc::new(Mutex::new(open_memory(None)));
        let err = backup(&raw, &raw, &mut BackupOptions::default()).unwrap_err();
        assert!(matches!(err, AsqliteError::Usage(_)));
    }

    #[test]
    fn backup_copies_rows_and_reports_progress() {
        let source = Arc::new(Mutex::new(open_memory(None)));
        let target = Arc::new(Mutex::new(open_memory(None)));
        source
            .lock()
            .unwrap()
            .live()
            .unwrap()
            .execute_batch("CREATE TABLE t(x); INSERT INTO t VALUES (1), (2);")
            .unwrap();

        let steps = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&steps);
        let mut options = BackupOptions {
            pages: 1,
            sleep: Duration::ZERO,
            progress: Some(Box::new(move |_: Progress| *seen.lock().unwrap() += 1)),
        };
        backup(&source, &target, &mut options).unwrap();

        let count: i64 = target
            .lock()
            .unwrap()
            .live()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert!(*steps.lock().unwrap() >= 1);
    }
}
