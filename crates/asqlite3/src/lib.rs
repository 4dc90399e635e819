// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async connections and cursors over SQLite.
//!
//! Every engine call runs on Tokio's blocking pool. A connection and all
//! cursors derived from it share one [`SharedLock`]; statement execution,
//! commit, rollback and dumps take that lock first, so within one connection
//! family they never overlap and run in arrival order. Cheap calls (fetches,
//! registrations, close) skip the lock, and cursor metadata is read without
//! touching the engine at all.
//!
//! ```no_run
//! # async fn demo() -> Result<(), asqlite3::AsqliteError> {
//! use asqlite3::{Params, connect};
//!
//! let conn = connect(":memory:").await?;
//! conn.executescript("CREATE TABLE kv(k TEXT PRIMARY KEY, v)").await?;
//! conn.execute(
//!     "INSERT INTO kv VALUES (?, ?)",
//!     Some(Params::positional(["a".to_string(), "1".to_string()])),
//! )
//! .await?;
//! let rows = conn.execute("SELECT k, v FROM kv", None).await?.fetchall().await?;
//! assert_eq!(rows.len(), 1);
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

mod connect;
mod connection;
mod cursor;
mod forward;
mod lock;
mod native;
mod offload;

pub use connect::{connect, connect_with};
pub use connection::{AsEngine, Connection};
pub use cursor::Cursor;
pub use lock::{LockGuard, SharedLock};
pub use native::connection::BackupOptions;
pub use native::{CursorMeta, EngineConnection};
pub use offload::run_blocking;

pub use asqlite3_config::ConnectConfig;
pub use asqlite3_core::{AsqliteError, IsolationLevel, Params, Row, Value};
pub use rusqlite::backup::Progress;
pub use rusqlite::functions::{Aggregate, Context, FunctionFlags};
