// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async cursor handle.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use asqlite3_core::{AsqliteError, Params, Row};
use tracing::warn;

use crate::forward::{Forwarder, Policy};
use crate::lock::SharedLock;
use crate::native::{CursorMeta, CursorShared, EngineConnection, RawConnection, RawCursor};

/// A cursor over a [`Connection`](crate::Connection).
///
/// Shares the lock of the connection it came from, so its statements queue
/// behind the connection's and vice versa. Metadata accessors read the last
/// published snapshot and never wait.
#[derive(Clone)]
pub struct Cursor {
    inner: Forwarder<RawCursor>,
    shared: Arc<CursorShared>,
    engine: EngineConnection,
}

impl Cursor {
    pub(crate) fn from_native(parent: &Forwarder<RawConnection>, raw: RawCursor) -> Self {
        let shared = Arc::clone(raw.shared());
        let engine = EngineConnection::new(Arc::clone(raw.connection()));
        Self {
            inner: parent.child(raw),
            shared,
            engine,
        }
    }

    pub fn lock(&self) -> &SharedLock {
        self.inner.lock()
    }

    pub async fn execute(
        &self,
        sql: impl Into<String>,
        params: Option<Params>,
    ) -> Result<&Self, AsqliteError> {
        let sql = sql.into();
        let params = Params::normalize(params);
        self.inner
            .forward("cursor.execute", Policy::Locked, move |cur| {
                cur.execute(&sql, params)
            })
            .await?;
        Ok(self)
    }

    pub async fn executemany<I>(&self, sql: impl Into<String>, seq: I) -> Result<&Self, AsqliteError>
    where
        I: IntoIterator<Item = Params>,
    {
        let sql = sql.into();
        let seq: Vec<Params> = seq.into_iter().collect();
        self.inner
            .forward("cursor.executemany", Policy::Locked, move |cur| {
                cur.executemany(&sql, seq)
            })
            .await?;
        Ok(self)
    }

    pub async fn executescript(&self, script: impl Into<String>) -> Result<&Self, AsqliteError> {
        let script = script.into();
        self.inner
            .forward("cursor.executescript", Policy::Locked, move |cur| {
                cur.executescript(&script)
            })
            .await?;
        Ok(self)
    }

    /// Next buffered row, or `None` when exhausted.
    pub async fn fetchone(&self) -> Result<Option<Row>, AsqliteError> {
        self.inner
            .forward("fetchone", Policy::Offload, |cur| cur.fetchone())
            .await
    }

    /// Up to `size` rows; `None` uses [`Cursor::arraysize`].
    pub async fn fetchmany(&self, size: Option<usize>) -> Result<Vec<Row>, AsqliteError> {
        self.inner
            .forward("fetchmany", Policy::Offload, move |cur| cur.fetchmany(size))
            .await
    }

    pub async fn fetchall(&self) -> Result<Vec<Row>, AsqliteError> {
        self.inner
            .forward("fetchall", Policy::Offload, |cur| cur.fetchall())
            .await
    }

    /// Accepted for API compatibility; does nothing.
    pub fn setinputsizes<S>(&self, _sizes: S) {}

    /// Accepted for API compatibility; does nothing.
    pub fn setoutputsize(&self, _size: usize, _column: Option<usize>) {}

    pub fn rowcount(&self) -> i64 {
        self.shared.meta().rowcount
    }

    pub fn lastrowid(&self) -> Option<i64> {
        self.shared.meta().lastrowid
    }

    /// Column names of the last row-returning statement.
    pub fn description(&self) -> Option<Arc<[String]>> {
        self.shared.meta().description.clone()
    }

    /// All metadata from one consistent snapshot.
    pub fn meta(&self) -> Arc<CursorMeta> {
        self.shared.meta()
    }

    pub fn arraysize(&self) -> usize {
        self.shared.arraysize()
    }

    pub fn set_arraysize(&self, size: usize) {
        self.shared.set_arraysize(size);
    }

    /// The native connection this cursor runs on.
    pub fn connection(&self) -> EngineConnection {
        self.engine.clone()
    }

    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), AsqliteError> {
        self.inner
            .forward("cursor.close", Policy::Offload, |cur| {
                cur.close();
                Ok(())
            })
            .await
    }

    /// Run `body` with this cursor, then close it on every exit path.
    pub async fn scope<F, Fut, T>(self, body: F) -> Result<T, AsqliteError>
    where
        F: FnOnce(Cursor) -> Fut,
        Fut: Future<Output = Result<T, AsqliteError>>,
    {
        let result = body(self.clone()).await;
        if let Err(err) = self.close().await {
            if result.is_ok() {
                return Err(err);
            }
            warn!(error = %err, "cursor close failed after scope body error");
        }
        result
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("meta", &self.shared.meta())
            .field("arraysize", &self.arraysize())
            .field("engine", &self.engine)
            .finish()
    }
}
