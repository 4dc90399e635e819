// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types for asqlite3.
//!
//! This crate provides the error type and the value, parameter and row types
//! used by both the synchronous native adapter and the async facade.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AsqliteError;
pub use types::{IsolationLevel, Params, Row, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asqlite_error_has_all_variants() {
        let _engine = AsqliteError::Engine(rusqlite::Error::QueryReturnedNoRows);
        let _conn = AsqliteError::ConnectionClosed;
        let _cursor = AsqliteError::CursorClosed;
        let _usage = AsqliteError::Usage("test".into());
        let _config = AsqliteError::Config("test".into());
        let _worker = AsqliteError::Worker("test".into());
        let _internal = AsqliteError::Internal("test".into());
    }

    #[test]
    fn engine_errors_keep_their_kind() {
        let err: AsqliteError = rusqlite::Error::InvalidParameterCount(1, 2).into();
        assert!(matches!(
            err.as_engine(),
            Some(rusqlite::Error::InvalidParameterCount(1, 2))
        ));
        assert_eq!(err.to_string(), rusqlite::Error::InvalidParameterCount(1, 2).to_string());
        assert!(AsqliteError::CursorClosed.as_engine().is_none());
    }
}
