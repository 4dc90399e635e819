// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./asqlite3.toml` > `~/.config/asqlite3/asqlite3.toml` >
//! `/etc/asqlite3/asqlite3.toml` with environment variable overrides via `ASQLITE3_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::Asqlite3Config;

pub(crate) const LOCAL_CONFIG: &str = "asqlite3.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/asqlite3/asqlite3.toml";

/// Path of the per-user config file, if the platform has a config directory.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("asqlite3").join(LOCAL_CONFIG))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/asqlite3/asqlite3.toml` (system-wide)
/// 3. `~/.config/asqlite3/asqlite3.toml` (user XDG config)
/// 4. `./asqlite3.toml` (local directory)
/// 5. `ASQLITE3_*` environment variables
pub fn load_config() -> Result<Asqlite3Config, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<Asqlite3Config, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(Asqlite3Config::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<Asqlite3Config, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(Asqlite3Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Asqlite3Config::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `ASQLITE3_CONNECTION_TIMEOUT_MS` must map to
/// `connection.timeout_ms`, not `connection.timeout.ms`.
fn env_provider() -> Env {
    Env::prefixed("ASQLITE3_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("connection_", "connection.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
