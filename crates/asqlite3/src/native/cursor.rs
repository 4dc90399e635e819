// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native cursor built on prepared statements.
//!
//! Result rows are buffered when a statement runs; fetches drain the buffer.
//! Metadata is published to a [`CursorShared`] snapshot after each execution
//! so the async wrapper can read it without touching the engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use asqlite3_core::{AsqliteError, Params, Row, Value};
use rusqlite::Statement;

use super::connection::{RawConnection, is_dml, is_insert};
use crate::offload::lock_native;

/// Metadata of a cursor's most recent execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorMeta {
    /// Rows changed by the last DML statement, `-1` otherwise.
    pub rowcount: i64,
    /// Row id of the last successful `INSERT`/`REPLACE`.
    pub lastrowid: Option<i64>,
    /// Column names of the last row-returning statement.
    pub description: Option<Arc<[String]>>,
}

impl Default for CursorMeta {
    fn default() -> Self {
        Self {
            rowcount: -1,
            lastrowid: None,
            description: None,
        }
    }
}

/// State readable without the native cursor's mutex.
pub(crate) struct CursorShared {
    meta: ArcSwap<CursorMeta>,
    arraysize: AtomicUsize,
}

impl CursorShared {
    fn new() -> Self {
        Self {
            meta: ArcSwap::from_pointee(CursorMeta::default()),
            arraysize: AtomicUsize::new(1),
        }
    }

    pub(crate) fn meta(&self) -> Arc<CursorMeta> {
        self.meta.load_full()
    }

    fn publish(&self, meta: CursorMeta) {
        self.meta.store(Arc::new(meta));
    }

    pub(crate) fn arraysize(&self) -> usize {
        self.arraysize.load(Ordering::Relaxed)
    }

    pub(crate) fn set_arraysize(&self, size: usize) {
        self.arraysize.store(size, Ordering::Relaxed);
    }
}

pub(crate) struct RawCursor {
    conn: Arc<Mutex<RawConnection>>,
    rows: VecDeque<Row>,
    closed: bool,
    shared: Arc<CursorShared>,
}

impl RawCursor {
    pub(crate) fn new(conn: Arc<Mutex<RawConnection>>) -> Self {
        Self {
            conn,
            rows: VecDeque::new(),
            closed: false,
            shared: Arc::new(CursorShared::new()),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<CursorShared> {
        &self.shared
    }

    pub(crate) fn connection(&self) -> &Arc<Mutex<RawConnection>> {
        &self.conn
    }

    pub(crate) fn execute(&mut self, sql: &str, params: Params) -> Result<(), AsqliteError> {
        let conn = Arc::clone(&self.conn);
        let raw = lock_native(&conn)?;
        self.execute_with(&raw, sql, params)
    }

    /// Run `sql` on an already locked connection.
    pub(crate) fn execute_with(
        &mut self,
        raw: &RawConnection,
        sql: &str,
        params: Params,
    ) -> Result<(), AsqliteError> {
        self.check_open()?;
        let previous = self.shared.meta();
        let outcome = run_statement(raw, sql, &params, previous.lastrowid);
        self.settle(outcome, previous.lastrowid)
    }

    pub(crate) fn executemany(
        &mut self,
        sql: &str,
        seq: Vec<Params>,
    ) -> Result<(), AsqliteError> {
        let conn = Arc::clone(&self.conn);
        let raw = lock_native(&conn)?;
        self.executemany_with(&raw, sql, seq)
    }

    /// Run a non-row-returning statement once per parameter set.
    pub(crate) fn executemany_with(
        &mut self,
        raw: &RawConnection,
        sql: &str,
        seq: Vec<Params>,
    ) -> Result<(), AsqliteError> {
        self.check_open()?;
        let previous = self.shared.meta();
        let outcome = run_many(raw, sql, &seq, previous.lastrowid);
        self.settle(outcome, previous.lastrowid)
    }

    pub(crate) fn executescript(&mut self, script: &str) -> Result<(), AsqliteError> {
        let conn = Arc::clone(&self.conn);
        let raw = lock_native(&conn)?;
        self.executescript_with(&raw, script)
    }

    pub(crate) fn executescript_with(
        &mut self,
        raw: &RawConnection,
        script: &str,
    ) -> Result<(), AsqliteError> {
        self.check_open()?;
        let previous = self.shared.meta();
        let outcome = run_script(raw, script, previous.lastrowid);
        self.settle(outcome, previous.lastrowid)
    }

    /// Install the rows and metadata of a finished execution. A failed one
    /// leaves the cursor empty with reset metadata.
    fn settle(
        &mut self,
        outcome: Result<(VecDeque<Row>, CursorMeta), AsqliteError>,
        lastrowid: Option<i64>,
    ) -> Result<(), AsqliteError> {
        match outcome {
            Ok((rows, meta)) => {
                self.rows = rows;
                self.shared.publish(meta);
                Ok(())
            }
            Err(err) => {
                self.rows.clear();
                self.shared.publish(CursorMeta {
                    lastrowid,
                    ..CursorMeta::default()
                });
                Err(err)
            }
        }
    }

    pub(crate) fn fetchone(&mut self) -> Result<Option<Row>, AsqliteError> {
        self.check_fetch()?;
        Ok(self.rows.pop_front())
    }

    /// Up to `size` rows, defaulting to the cursor's array size.
    pub(crate) fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>, AsqliteError> {
        self.check_fetch()?;
        let size = size.unwrap_or_else(|| self.shared.arraysize());
        let take = size.min(self.rows.len());
        Ok(self.rows.drain(..take).collect())
    }

    pub(crate) fn fetchall(&mut self) -> Result<Vec<Row>, AsqliteError> {
        self.check_fetch()?;
        Ok(self.rows.drain(..).collect())
    }

    /// Idempotent.
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }

    fn check_open(&self) -> Result<(), AsqliteError> {
        if self.closed {
            return Err(AsqliteError::CursorClosed);
        }
        Ok(())
    }

    // Fetching from a cursor whose connection was closed fails even when rows
    // are still buffered.
    fn check_fetch(&self) -> Result<(), AsqliteError> {
        self.check_open()?;
        if lock_native(&self.conn)?.is_closed() {
            return Err(AsqliteError::ConnectionClosed);
        }
        Ok(())
    }
}

fn run_statement(
    raw: &RawConnection,
    sql: &str,
    params: &Params,
    lastrowid: Option<i64>,
) -> Result<(VecDeque<Row>, CursorMeta), AsqliteError> {
    let conn = raw.live()?;
    let mut stmt = conn.prepare_cached(sql)?;
    bind(&mut stmt, params)?;
    raw.begin_implicit(sql)?;
    let column_count = stmt.column_count();

    if column_count > 0 {
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut buffered = VecDeque::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let values = (0..column_count)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            buffered.push_back(Row::new(Arc::clone(&columns), values));
        }
        let meta = CursorMeta {
            rowcount: -1,
            lastrowid,
            description: Some(columns),
        };
        return Ok((buffered, meta));
    }

    stmt.raw_execute()?;
    let rowcount = if is_dml(sql) {
        to_i64(conn.changes())
    } else {
        -1
    };
    let lastrowid = if is_insert(sql) {
        Some(conn.last_insert_rowid())
    } else {
        lastrowid
    };
    Ok((
        VecDeque::new(),
        CursorMeta {
            rowcount,
            lastrowid,
            description: None,
        },
    ))
}

fn run_many(
    raw: &RawConnection,
    sql: &str,
    seq: &[Params],
    lastrowid: Option<i64>,
) -> Result<(VecDeque<Row>, CursorMeta), AsqliteError> {
    let conn = raw.live()?;
    let mut stmt = conn.prepare_cached(sql)?;
    if stmt.column_count() > 0 {
        return Err(rusqlite::Error::ExecuteReturnedResults.into());
    }
    raw.begin_implicit(sql)?;
    let mut changed = 0i64;
    for params in seq {
        bind(&mut stmt, params)?;
        changed += to_i64(stmt.raw_execute()?);
    }

    let lastrowid = if is_insert(sql) && !seq.is_empty() {
        Some(conn.last_insert_rowid())
    } else {
        lastrowid
    };
    Ok((
        VecDeque::new(),
        CursorMeta {
            rowcount: if is_dml(sql) { changed } else { -1 },
            lastrowid,
            description: None,
        },
    ))
}

fn run_script(
    raw: &RawConnection,
    script: &str,
    lastrowid: Option<i64>,
) -> Result<(VecDeque<Row>, CursorMeta), AsqliteError> {
    raw.commit_implicit()?;
    raw.live()?.execute_batch(script)?;
    Ok((
        VecDeque::new(),
        CursorMeta {
            lastrowid,
            ..CursorMeta::default()
        },
    ))
}

fn to_i64<N: TryInto<i64>>(n: N) -> i64 {
    n.try_into().unwrap_or(i64::MAX)
}

fn bind(stmt: &mut Statement<'_>, params: &Params) -> Result<(), AsqliteError> {
    let expected = stmt.parameter_count();
    match params {
        Params::Positional(values) => {
            if values.len() != expected {
                return Err(rusqlite::Error::InvalidParameterCount(values.len(), expected).into());
            }
            for (i, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, value)?;
            }
        }
        Params::Named(pairs) => {
            for index in 1..=expected {
                let Some(placeholder) = stmt.parameter_name(index).map(str::to_owned) else {
                    return Err(AsqliteError::Usage(format!(
                        "statement uses positional placeholder {index}; named parameters were supplied"
                    )));
                };
                let key = strip_prefix(&placeholder);
                let value = pairs
                    .iter()
                    .find(|(name, _)| strip_prefix(name) == key)
                    .map(|(_, value)| value)
                    .ok_or_else(|| {
                        AsqliteError::Usage(format!(
                            "no value supplied for named parameter {placeholder}"
                        ))
                    })?;
                stmt.raw_bind_parameter(index, value)?;
            }
        }
    }
    Ok(())
}

fn strip_prefix(name: &str) -> &str {
    name.strip_prefix([':', '@', '$']).unwrap_or(name)
}
