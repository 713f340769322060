// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tsunagi CRM backend.

use thiserror::Error;

/// The primary error type used across all Tsunagi crates.
#[derive(Debug, Error)]
pub enum TsunagiError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Authoritative storage errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Realtime mirror errors. Always non-fatal to ingestion; callers log and continue.
    #[error("mirror error: {message}")]
    Mirror {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Messaging platform errors (profile fetch, push delivery, transport).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Identity resolution failure: no customer could be found or created.
    #[error("identity resolution failed: {0}")]
    Resolution(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
