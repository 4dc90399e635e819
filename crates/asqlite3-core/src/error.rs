// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the asqlite3 crates.

use thiserror::Error;

/// The error type returned by every asqlite3 connection and cursor operation.
///
/// Engine failures are carried unchanged in [`AsqliteError::Engine`] so callers
/// can match on the underlying `rusqlite` error kind.
#[derive(Debug, Error)]
pub enum AsqliteError {
    /// An error raised by the SQLite engine (SQL, constraint, I/O failures).
    #[error(transparent)]
    Engine(#[from] rusqlite::Error),

    /// The connection was closed before the operation ran.
    #[error("cannot operate on a closed connection")]
    ConnectionClosed,

    /// The cursor was closed before the operation ran.
    #[error("cannot operate on a closed cursor")]
    CursorClosed,

    /// The caller broke a contract of this layer (wrong call shape, bad parameter keys).
    #[error("usage error: {0}")]
    Usage(String),

    /// Invalid connection configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The worker thread running an engine call was torn down before it finished.
    #[error("worker task failed: {0}")]
    Worker(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AsqliteError {
    /// Returns the underlying engine error, if this is one.
    pub fn as_engine(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Engine(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the SQLite primary result code for engine failures.
    pub fn sqlite_error_code(&self) -> Option<rusqlite::ErrorCode> {
        self.as_engine().and_then(|e| e.sqlite_error_code())
    }
}
