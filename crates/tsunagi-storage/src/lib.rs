// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Tsunagi CRM backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed CRUD operations for
//! customers, identifiers, messages, leads and activities, the transactional
//! identity resolver, and the monotonic change feed.

pub mod database;
pub mod feed;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod resolver;

pub use database::Database;
pub use models::*;
pub use resolver::{ResolveRequest, resolve, resolve_with_fallback};
