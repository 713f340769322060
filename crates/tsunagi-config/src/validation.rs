// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and sane poll bounds.

use thiserror::Error;

use crate::model::TsunagiConfig;

/// A configuration error surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config sources could not be parsed or merged.
    #[error("{message}")]
    Parse { message: String },

    /// A semantic constraint on a parsed value was violated.
    #[error("{message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TsunagiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.mirror.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "mirror.path must not be empty".to_string(),
        });
    }

    if config.mirror.retain == 0 {
        errors.push(ConfigError::Validation {
            message: "mirror.retain must be at least 1".to_string(),
        });
    }

    if config.feed.max_batch < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "feed.max_batch must be at least 1, got {}",
                config.feed.max_batch
            ),
        });
    }

    if config.poll.max_timeout_secs == 0 || config.poll.max_timeout_secs > 30 {
        errors.push(ConfigError::Validation {
            message: format!(
                "poll.max_timeout_secs must be in 1..=30, got {}",
                config.poll.max_timeout_secs
            ),
        });
    }

    if config.poll.check_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "poll.check_interval_ms must be at least 1".to_string(),
        });
    }

    if config.crm.follow_up_days < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "crm.follow_up_days must be non-negative, got {}",
                config.crm.follow_up_days
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
