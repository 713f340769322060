// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes; the
//! atomic version counter relies on the single-writer model plus SQLite
//! transactions, never on in-process state.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use tsunagi_config::model::StorageConfig;
use tsunagi_core::TsunagiError;

/// Handle to the authoritative SQLite database.
///
/// Cheap to clone: all clones share the same background writer thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if absent) the database at the configured path,
    /// apply PRAGMAs, and run embedded migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, TsunagiError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| TsunagiError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::from(e)))?;

        let wal = config.wal_mode;
        conn.call(
            move |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                if wal {
                    conn.execute_batch(
                        "PRAGMA journal_mode = WAL;
                         PRAGMA synchronous = NORMAL;",
                    )?;
                }
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;",
                )?;
                crate::migrations::run_migrations(conn)?;
                Ok(())
            },
        )
        .await
        .map_err(map_tr_box_err)?;

        debug!(path = path.as_str(), "database opened and migrated");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Cheap liveness probe used by the health gate of the long-poll loop.
    pub async fn probe(&self) -> Result<(), TsunagiError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), TsunagiError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err<E>(err: tokio_rusqlite::Error<E>) -> TsunagiError
where
    E: std::error::Error + Send + Sync + 'static,
{
    TsunagiError::Storage {
        source: Box::new(err),
    }
}

/// Map a tokio-rusqlite error whose application payload is a boxed error
/// (`Box<dyn Error>` does not itself implement `Error`, so it cannot flow
/// through [`map_tr_err`]).
pub(crate) fn map_tr_box_err(
    err: tokio_rusqlite::Error<Box<dyn std::error::Error + Send + Sync>>,
) -> TsunagiError {
    let source: Box<dyn std::error::Error + Send + Sync> = match err {
        tokio_rusqlite::Error::Error(inner) => inner,
        tokio_rusqlite::Error::Close((_, e)) => Box::new(e),
        other => Box::new(std::io::Error::other(other.to_string())),
    };
    TsunagiError::Storage { source }
}
