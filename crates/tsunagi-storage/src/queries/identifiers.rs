// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifier lookup and idempotent binding.
//!
//! Identifiers are created with `INSERT OR IGNORE` against the
//! UNIQUE (kind, value) constraint: never duplicated, never updated in
//! place, never re-owned.

use rusqlite::params;

use tsunagi_core::TsunagiError;

use crate::database::Database;
use crate::models::Identifier;

/// Find the customer owning an identifier, if any.
pub async fn find_customer_id(
    db: &Database,
    kind: &str,
    value: &str,
) -> Result<Option<i64>, TsunagiError> {
    let kind = kind.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT customer_id FROM identifiers WHERE kind = ?1 AND value = ?2",
                params![kind, value],
                |row| row.get(0),
            );
            match result {
                Ok(id) => Ok(Some(id)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all identifiers owned by a customer.
pub async fn list_for_customer(
    db: &Database,
    customer_id: i64,
) -> Result<Vec<Identifier>, TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Identifier>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, kind, value, customer_id, created_at
                 FROM identifiers WHERE customer_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![customer_id], |row| {
                Ok(Identifier {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                    value: row.get(2)?,
                    customer_id: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            let mut identifiers = Vec::new();
            for row in rows {
                identifiers.push(row?);
            }
            Ok(identifiers)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transaction-scoped `create-if-absent`. Used by the identity resolver.
///
/// A (kind, value) pair already owned by another customer is left untouched;
/// ownership never moves through this path.
pub(crate) fn ensure_in_tx(
    tx: &rusqlite::Transaction<'_>,
    kind: &str,
    value: &str,
    customer_id: i64,
) -> Result<(), rusqlite::Error> {
    tx.execute(
        "INSERT OR IGNORE INTO identifiers (kind, value, customer_id) VALUES (?1, ?2, ?3)",
        params![kind, value, customer_id],
    )?;
    Ok(())
}

/// Transaction-scoped owner lookup. Used by the identity resolver.
pub(crate) fn find_customer_id_in_tx(
    tx: &rusqlite::Transaction<'_>,
    kind: &str,
    value: &str,
) -> Result<Option<i64>, rusqlite::Error> {
    let result = tx.query_row(
        "SELECT customer_id FROM identifiers WHERE kind = ?1 AND value = ?2",
        params![kind, value],
        |row| row.get(0),
    );
    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolveRequest, resolve};
    use tempfile::tempdir;
    use tsunagi_config::model::StorageConfig;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn unknown_identifier_has_no_owner() {
        let (db, _dir) = setup_db().await;
        let owner = find_customer_id(&db, "line", "U-none").await.unwrap();
        assert!(owner.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn resolver_binds_handle_identifier() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U-bound")).await.unwrap();

        let owner = find_customer_id(&db, "line", "U-bound").await.unwrap();
        assert_eq!(owner, Some(customer.id));

        let identifiers = list_for_customer(&db, customer.id).await.unwrap();
        assert_eq!(identifiers.len(), 1);
        assert_eq!(identifiers[0].kind, "line");
        assert_eq!(identifiers[0].value, "U-bound");

        db.close().await.unwrap();
    }
}
