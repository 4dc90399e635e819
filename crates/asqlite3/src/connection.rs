// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async connection handle.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use asqlite3_core::{AsqliteError, IsolationLevel, Params};
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::InterruptHandle;
use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::types::ToSql;
use tracing::{debug, warn};

use crate::cursor::Cursor;
use crate::forward::{Forwarder, Policy};
use crate::lock::SharedLock;
use crate::native::connection::{self as native_conn, BackupOptions};
use crate::native::{EngineConnection, RawConnection, RawCursor, dump};
use crate::offload::run_blocking;

/// An open database connection.
///
/// Clones share the native connection and its lock. Statement execution,
/// transaction control and dumps of one connection family never overlap and
/// run in the order their callers queued for the lock.
#[derive(Clone)]
pub struct Connection {
    inner: Forwarder<RawConnection>,
    interrupt: Arc<InterruptHandle>,
}

/// Anything that resolves to a native engine connection.
pub trait AsEngine {
    fn as_engine(&self) -> EngineConnection;
}

impl Connection {
    pub(crate) fn new(raw: RawConnection, interrupt: InterruptHandle) -> Self {
        Self {
            inner: Forwarder::new(raw, SharedLock::new()),
            interrupt: Arc::new(interrupt),
        }
    }

    /// The lock shared with every cursor derived from this connection.
    pub fn lock(&self) -> &SharedLock {
        self.inner.lock()
    }

    /// Identity of the underlying native connection.
    pub fn engine(&self) -> EngineConnection {
        EngineConnection::new(Arc::clone(self.inner.handle()))
    }

    /// A fresh cursor over this connection. Waits for the connection lock.
    pub async fn cursor(&self) -> Result<Cursor, AsqliteError> {
        let handle = Arc::clone(self.inner.handle());
        let raw = self
            .inner
            .forward("cursor", Policy::Locked, move |conn| {
                conn.live()?;
                Ok(RawCursor::new(handle))
            })
            .await?;
        Ok(Cursor::from_native(&self.inner, raw))
    }

    /// Run one statement on a new cursor and return that cursor.
    pub async fn execute(
        &self,
        sql: impl Into<String>,
        params: Option<Params>,
    ) -> Result<Cursor, AsqliteError> {
        let sql = sql.into();
        let params = Params::normalize(params);
        let handle = Arc::clone(self.inner.handle());
        let raw = self
            .inner
            .forward("execute", Policy::Locked, move |conn| {
                let mut cursor = RawCursor::new(handle);
                cursor.execute_with(conn, &sql, params)?;
                Ok(cursor)
            })
            .await?;
        Ok(Cursor::from_native(&self.inner, raw))
    }

    /// Run one statement per parameter set on a new cursor.
    pub async fn executemany<I>(&self, sql: impl Into<String>, seq: I) -> Result<Cursor, AsqliteError>
    where
        I: IntoIterator<Item = Params>,
    {
        let sql = sql.into();
        let seq: Vec<Params> = seq.into_iter().collect();
        let handle = Arc::clone(self.inner.handle());
        let raw = self
            .inner
            .forward("executemany", Policy::Locked, move |conn| {
                let mut cursor = RawCursor::new(handle);
                cursor.executemany_with(conn, &sql, seq)?;
                Ok(cursor)
            })
            .await?;
        Ok(Cursor::from_native(&self.inner, raw))
    }

    /// Run a multi-statement script on a new cursor. No parameter substitution.
    pub async fn executescript(&self, script: impl Into<String>) -> Result<Cursor, AsqliteError> {
        let script = script.into();
        let handle = Arc::clone(self.inner.handle());
        let raw = self
            .inner
            .forward("executescript", Policy::Locked, move |conn| {
                let mut cursor = RawCursor::new(handle);
                cursor.executescript_with(conn, &script)?;
                Ok(cursor)
            })
            .await?;
        Ok(Cursor::from_native(&self.inner, raw))
    }

    pub async fn commit(&self) -> Result<(), AsqliteError> {
        self.inner
            .forward("commit", Policy::Locked, |conn| conn.commit())
            .await
    }

    pub async fn rollback(&self) -> Result<(), AsqliteError> {
        self.inner
            .forward("rollback", Policy::Locked, |conn| conn.rollback())
            .await
    }

    /// Close the native connection. Any open transaction is rolled back by the
    /// engine. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), AsqliteError> {
        self.inner
            .forward("close", Policy::Offload, |conn| conn.close())
            .await?;
        debug!("connection closed");
        Ok(())
    }

    /// Abort whatever statement the engine is running. Returns immediately.
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    pub async fn in_transaction(&self) -> Result<bool, AsqliteError> {
        self.inner
            .forward("in_transaction", Policy::Offload, |conn| conn.in_transaction())
            .await
    }

    /// Rows changed since the connection was opened.
    pub async fn total_changes(&self) -> Result<i64, AsqliteError> {
        self.inner
            .forward("total_changes", Policy::Offload, |conn| conn.total_changes())
            .await
    }

    pub async fn isolation_level(&self) -> Result<Option<IsolationLevel>, AsqliteError> {
        self.inner
            .forward("isolation_level", Policy::Offload, |conn| {
                conn.live()?;
                Ok(conn.isolation_level())
            })
            .await
    }

    /// Set the implicit transaction mode. `None` commits any pending
    /// transaction and switches to autocommit.
    pub async fn set_isolation_level(
        &self,
        level: Option<IsolationLevel>,
    ) -> Result<(), AsqliteError> {
        self.inner
            .forward("set_isolation_level", Policy::Offload, move |conn| {
                conn.set_isolation_level(level)
            })
            .await
    }

    /// Register a scalar SQL function. `n_arg` of `-1` accepts any arity.
    pub async fn create_function<F, T>(
        &self,
        name: impl Into<String>,
        n_arg: i32,
        flags: FunctionFlags,
        func: F,
    ) -> Result<(), AsqliteError>
    where
        F: Fn(&Context<'_>) -> rusqlite::Result<T> + Send + UnwindSafe + 'static,
        T: ToSql,
    {
        let name = name.into();
        self.inner
            .forward("create_function", Policy::Offload, move |conn| {
                conn.live()?
                    .create_scalar_function(name.as_str(), n_arg, flags, func)?;
                Ok(())
            })
            .await
    }

    /// Register an aggregate SQL function.
    pub async fn create_aggregate<A, D, T>(
        &self,
        name: impl Into<String>,
        n_arg: i32,
        flags: FunctionFlags,
        aggregate: D,
    ) -> Result<(), AsqliteError>
    where
        A: RefUnwindSafe + UnwindSafe,
        D: Aggregate<A, T> + Send + 'static,
        T: ToSql,
    {
        let name = name.into();
        self.inner
            .forward("create_aggregate", Policy::Offload, move |conn| {
                conn.live()?
                    .create_aggregate_function(name.as_str(), n_arg, flags, aggregate)?;
                Ok(())
            })
            .await
    }

    /// Register a collation usable in `COLLATE` clauses.
    pub async fn create_collation<C>(
        &self,
        name: impl Into<String>,
        compare: C,
    ) -> Result<(), AsqliteError>
    where
        C: Fn(&str, &str) -> Ordering + Send + UnwindSafe + 'static,
    {
        let name = name.into();
        self.inner
            .forward("create_collation", Policy::Offload, move |conn| {
                conn.live()?.create_collation(name.as_str(), compare)?;
                Ok(())
            })
            .await
    }

    /// Call `handler` every `n_ops` virtual machine instructions. A handler
    /// returning `true` aborts the running statement.
    pub async fn set_progress_handler<F>(&self, n_ops: i32, handler: F) -> Result<(), AsqliteError>
    where
        F: FnMut() -> bool + Send + RefUnwindSafe + 'static,
    {
        self.inner
            .forward("set_progress_handler", Policy::Offload, move |conn| {
                conn.live()?.progress_handler(n_ops, Some(handler));
                Ok(())
            })
            .await
    }

    pub async fn clear_progress_handler(&self) -> Result<(), AsqliteError> {
        self.inner
            .forward("clear_progress_handler", Policy::Offload, |conn| {
                conn.live()?.progress_handler(0, None::<fn() -> bool>);
                Ok(())
            })
            .await
    }

    /// Allow or forbid loading engine extensions.
    ///
    /// # Safety
    ///
    /// Once enabled, SQL run on this connection can load arbitrary native code
    /// through `load_extension()`. Only enable it for trusted SQL.
    pub async unsafe fn enable_load_extension(&self, enabled: bool) -> Result<(), AsqliteError> {
        self.inner
            .forward("enable_load_extension", Policy::Offload, move |conn| {
                let conn = conn.live()?;
                if enabled {
                    // SAFETY: the caller vouches for the SQL run on this connection.
                    unsafe { conn.load_extension_enable()? };
                } else {
                    conn.load_extension_disable()?;
                }
                Ok(())
            })
            .await
    }

    /// Load a shared-library extension.
    ///
    /// # Safety
    ///
    /// The library's initialization code runs inside this process with full
    /// access to the engine. Only load trusted libraries.
    pub async unsafe fn load_extension(
        &self,
        path: impl Into<PathBuf>,
        entry_point: Option<String>,
    ) -> Result<(), AsqliteError> {
        let path = path.into();
        self.inner
            .forward("load_extension", Policy::Offload, move |conn| {
                let conn = conn.live()?;
                // SAFETY: the caller vouches for the library.
                unsafe { conn.load_extension(&path, entry_point.as_deref())? };
                Ok(())
            })
            .await
    }

    /// Dump the database as SQL text, one statement per item.
    ///
    /// Nothing runs until the stream is first polled. The dump is computed in
    /// one locked call and then replayed.
    pub fn iterdump(&self) -> BoxStream<'static, Result<String, AsqliteError>> {
        let inner = self.inner.clone();
        stream::once(async move {
            inner
                .forward("iterdump", Policy::Locked, |conn| dump::iterdump(conn.live()?))
                .await
        })
        .map(|result| match result {
            Ok(lines) => stream::iter(lines.into_iter().map(Ok::<String, AsqliteError>)).left_stream(),
            Err(err) => stream::iter(std::iter::once(Err(err))).right_stream(),
        })
        .flatten()
        .boxed()
    }

    /// Copy this database into `target`, page by page.
    pub async fn backup<T>(&self, target: &T, options: BackupOptions) -> Result<(), AsqliteError>
    where
        T: AsEngine + ?Sized,
    {
        let source = Arc::clone(self.inner.handle());
        let target = target.as_engine();
        let mut options = options;
        run_blocking(move || native_conn::backup(&source, target.raw(), &mut options)).await?;
        debug!("backup complete");
        Ok(())
    }

    /// Run `body` with this connection, then close it on every exit path.
    ///
    /// A body error takes precedence over a close error.
    pub async fn scope<F, Fut, T>(self, body: F) -> Result<T, AsqliteError>
    where
        F: FnOnce(Connection) -> Fut,
        Fut: Future<Output = Result<T, AsqliteError>>,
    {
        let result = body(self.clone()).await;
        let closed = self.close().await;
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(error = %close_err, "close failed after scope body error");
                Err(err)
            }
        }
    }
}

impl AsEngine for Connection {
    fn as_engine(&self) -> EngineConnection {
        self.engine()
    }
}

impl AsEngine for EngineConnection {
    fn as_engine(&self) -> EngineConnection {
        self.clone()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("engine", &self.engine())
            .field("lock", self.lock())
            .finish()
    }
}
