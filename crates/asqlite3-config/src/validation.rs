// SPDX-FileCopyrightText: 2026 asqlite3 Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.

use crate::diagnostic::ConfigError;
use crate::model::{Asqlite3Config, ConnectConfig};

/// Upper bound for the busy timeout.
const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &Asqlite3Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    collect_connect_errors(&config.connection, "connection.", &mut errors);

    if config.logging.level.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "logging.level must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate connection options on their own, as passed to `connect_with`.
pub fn validate_connect_config(config: &ConnectConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    collect_connect_errors(config, "", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_connect_errors(config: &ConnectConfig, prefix: &str, errors: &mut Vec<ConfigError>) {
    if config.database.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{prefix}database must not be empty"),
        });
    }

    if config.cached_statements == 0 {
        errors.push(ConfigError::Validation {
            message: format!("{prefix}cached_statements must be at least 1"),
        });
    }

    if config.timeout_ms > MAX_TIMEOUT_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "{prefix}timeout_ms must be at most {MAX_TIMEOUT_MS}, got {}",
                config.timeout_ms
            ),
        });
    }

    if config.read_only && config.is_in_memory() {
        errors.push(ConfigError::Validation {
            message: format!("{prefix}read_only cannot be used with an in-memory database"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Asqlite3Config::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = Asqlite3Config::default();
        config.connection.database = "  ".to_string();
        config.connection.cached_statements = 0;
        config.connection.timeout_ms = MAX_TIMEOUT_MS + 1;
        config.logging.level = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].to_string().contains("connection.database"));
    }

    #[test]
    fn read_only_memory_database_is_rejected() {
        let config = ConnectConfig {
            read_only: true,
            ..ConnectConfig::default()
        };
        let errors = validate_connect_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("read_only"));
    }

    #[test]
    fn read_only_file_database_is_accepted() {
        let config = ConnectConfig {
            read_only: true,
            ..ConnectConfig::new("data.db")
        };
        assert!(validate_connect_config(&config).is_ok());
    }
}
