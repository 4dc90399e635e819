// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for asqlite3.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at load time, providing actionable error messages.

use std::time::Duration;

use asqlite3_core::IsolationLevel;
use serde::{Deserialize, Serialize};

/// Top-level asqlite3 configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Asqlite3Config {
    /// Options forwarded to the engine when a connection is opened.
    #[serde(default)]
    pub connection: ConnectConfig,

    /// Log output settings used by the command-line tool.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-open options.
///
/// Forwarded verbatim to the engine, except that the engine's own
/// per-connection mutex is always disabled; that override is not configurable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectConfig {
    /// Path of the database file, `:memory:`, or a `file:` URI when `uri` is set.
    #[serde(default = "default_database")]
    pub database: String,

    /// How long a statement waits on a locked database file, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Implicit transaction mode for DML statements. Unset means autocommit.
    #[serde(default)]
    pub isolation_level: Option<IsolationLevel>,

    /// Open the database read-only.
    #[serde(default)]
    pub read_only: bool,

    /// Interpret `database` as a URI.
    #[serde(default = "default_true")]
    pub uri: bool,

    /// Create the database file if it does not exist.
    #[serde(default = "default_true")]
    pub create: bool,

    /// Capacity of the engine's prepared statement cache.
    #[serde(default = "default_cached_statements")]
    pub cached_statements: usize,
}

impl ConnectConfig {
    /// Configuration for `database` with every other option at its default.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == IN_MEMORY || self.database.contains("mode=memory")
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            timeout_ms: default_timeout_ms(),
            isolation_level: None,
            read_only: false,
            uri: default_true(),
            create: default_true(),
            cached_statements: default_cached_statements(),
        }
    }
}

/// The special database name for a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

fn default_database() -> String {
    IN_MEMORY.to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_cached_statements() -> usize {
    128
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive (e.g. `info`, `asqlite3=trace`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
