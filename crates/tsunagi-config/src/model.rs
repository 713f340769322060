// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tsunagi CRM backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Tsunagi configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TsunagiConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// LINE messaging platform settings.
    #[serde(default)]
    pub line: LineConfig,

    /// Authoritative storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Realtime mirror settings.
    #[serde(default)]
    pub mirror: MirrorConfig,

    /// Change feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Long-poll gateway settings.
    #[serde(default)]
    pub poll: PollConfig,

    /// CRM behavior settings.
    #[serde(default)]
    pub crm: CrmConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3010
}

fn default_log_level() -> String {
    "info".to_string()
}

/// LINE messaging platform configuration.
///
/// The channel access token used for outbound calls is sourced from this
/// persisted configuration only; there is no ad-hoc environment fallback at
/// call sites, so token changes take effect without a redeploy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LineConfig {
    /// Channel secret used for webhook signature verification.
    /// `None` fails verification closed unless `allow_unsigned` is set.
    #[serde(default)]
    pub channel_secret: Option<String>,

    /// Channel access token for profile fetch and push delivery.
    #[serde(default)]
    pub channel_token: Option<String>,

    /// Base URL of the LINE API (overridden in tests).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Accept unsigned webhooks. Development/test relaxation only; must be
    /// set explicitly and is never inferred from a missing secret.
    #[serde(default)]
    pub allow_unsigned: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: None,
            channel_token: None,
            api_base: default_api_base(),
            allow_unsigned: false,
        }
    }
}

fn default_api_base() -> String {
    "https://api.line.me".to_string()
}

/// Authoritative storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tsunagi").join("tsunagi.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tsunagi.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Realtime mirror configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Path to the redb mirror file.
    #[serde(default = "default_mirror_path")]
    pub path: String,

    /// Maximum projections retained per handle.
    #[serde(default = "default_retain")]
    pub retain: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            path: default_mirror_path(),
            retain: default_retain(),
        }
    }
}

fn default_mirror_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tsunagi").join("mirror.redb"))
        .unwrap_or_else(|| std::path::PathBuf::from("mirror.redb"))
        .to_string_lossy()
        .into_owned()
}

fn default_retain() -> usize {
    50
}

/// Change feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Maximum rows returned by a single `changes_since` batch.
    #[serde(default = "default_max_batch")]
    pub max_batch: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_batch: default_max_batch(),
        }
    }
}

fn default_max_batch() -> i64 {
    200
}

/// Long-poll gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Upper bound for a client-requested poll timeout, in seconds.
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: u64,

    /// Sleep between feed checks inside the poll loop, in milliseconds.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_timeout_secs: default_max_timeout_secs(),
            check_interval_ms: default_check_interval_ms(),
        }
    }
}

fn default_max_timeout_secs() -> u64 {
    30
}

fn default_check_interval_ms() -> u64 {
    500
}

/// CRM behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CrmConfig {
    /// Days from first contact to the default scheduled follow-up.
    #[serde(default = "default_follow_up_days")]
    pub follow_up_days: i64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            follow_up_days: default_follow_up_days(),
        }
    }
}

fn default_follow_up_days() -> i64 {
    3
}
