// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tsunagi.toml` > `~/.config/tsunagi/tsunagi.toml`
//! > `/etc/tsunagi/tsunagi.toml` with environment variable overrides via the
//! `TSUNAGI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TsunagiConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tsunagi/tsunagi.toml` (system-wide)
/// 3. `~/.config/tsunagi/tsunagi.toml` (user XDG config)
/// 4. `./tsunagi.toml` (local directory)
/// 5. `TSUNAGI_*` environment variables
pub fn load_config() -> Result<TsunagiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TsunagiConfig::default()))
        .merge(Toml::file("/etc/tsunagi/tsunagi.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tsunagi/tsunagi.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tsunagi.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TsunagiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TsunagiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TsunagiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TsunagiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TSUNAGI_LINE_CHANNEL_SECRET` must map
/// to `line.channel_secret`, not `line.channel.secret`.
fn env_provider() -> Env {
    Env::prefixed("TSUNAGI_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: TSUNAGI_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("line_", "line.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("mirror_", "mirror.", 1)
            .replacen("feed_", "feed.", 1)
            .replacen("poll_", "poll.", 1)
            .replacen("crm_", "crm.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_file() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3010);
        assert_eq!(config.poll.max_timeout_secs, 30);
        assert_eq!(config.poll.check_interval_ms, 500);
        assert_eq!(config.feed.max_batch, 200);
        assert!(config.line.channel_secret.is_none());
        assert!(!config.line.allow_unsigned);
    }

    #[test]
    fn toml_overrides_defaults() {
        let toml = r#"
            [server]
            port = 8080

            [line]
            channel_secret = "shh"
            channel_token = "tok"

            [crm]
            follow_up_days = 7
        "#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.line.channel_secret.as_deref(), Some("shh"));
        assert_eq!(config.line.channel_token.as_deref(), Some("tok"));
        assert_eq!(config.crm.follow_up_days, 7);
        // Untouched sections keep defaults.
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
            [server]
            prot = 8080
        "#;
        let result = load_config_from_str(toml);
        assert!(result.is_err(), "typo'd key should be rejected");
    }
}
