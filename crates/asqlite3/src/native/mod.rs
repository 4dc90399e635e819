// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous native handles over `rusqlite`.
//!
//! Nothing here is async or thread-aware beyond being `Send`: these types are
//! only ever touched from worker threads, behind the mutex of their owning
//! forwarder.

pub(crate) mod connection;
pub(crate) mod cursor;
pub(crate) mod dump;

pub use connection::EngineConnection;
pub use cursor::CursorMeta;

pub(crate) use connection::RawConnection;
pub(crate) use cursor::{CursorShared, RawCursor};
