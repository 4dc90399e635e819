// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opening connections.

use asqlite3_config::{ConnectConfig, validate_connect_config};
use asqlite3_core::AsqliteError;
use tracing::debug;

use crate::connection::Connection;
use crate::native::RawConnection;
use crate::offload::run_blocking;

/// Open `database` with default options.
///
/// `database` is a file path, `:memory:`, or a `file:` URI.
pub async fn connect(database: impl Into<String>) -> Result<Connection, AsqliteError> {
    connect_with(ConnectConfig::new(database)).await
}

/// Open a connection described by `config`.
///
/// The engine is opened on a worker thread. The returned connection has a
/// fresh, unlocked lock.
pub async fn connect_with(config: ConnectConfig) -> Result<Connection, AsqliteError> {
    validate_connect_config(&config).map_err(|errors| {
        AsqliteError::Config(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    let database = config.database.clone();
    let (raw, interrupt) = run_blocking(move || RawConnection::open(&config)).await?;
    debug!(database = %database, "connection opened");
    Ok(Connection::new(raw, interrupt))
}
