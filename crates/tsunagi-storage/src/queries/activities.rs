// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only customer activity log.

use rusqlite::params;

use tsunagi_core::TsunagiError;

use crate::database::Database;
use crate::models::Activity;

/// Record an activity event for a customer.
pub async fn record(
    db: &Database,
    customer_id: i64,
    kind: &str,
    detail: Option<serde_json::Value>,
) -> Result<(), TsunagiError> {
    let kind = kind.to_string();
    let detail = detail.map(|d| d.to_string());
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO activities (customer_id, kind, detail) VALUES (?1, ?2, ?3)",
                params![customer_id, kind, detail],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transaction-scoped append. Used by the identity resolver.
pub(crate) fn record_in_tx(
    tx: &rusqlite::Transaction<'_>,
    customer_id: i64,
    kind: &str,
    detail: Option<&serde_json::Value>,
) -> Result<(), rusqlite::Error> {
    tx.execute(
        "INSERT INTO activities (customer_id, kind, detail) VALUES (?1, ?2, ?3)",
        params![customer_id, kind, detail.map(|d| d.to_string())],
    )?;
    Ok(())
}

/// List a customer's activities, oldest first.
pub async fn list_for_customer(
    db: &Database,
    customer_id: i64,
) -> Result<Vec<Activity>, TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Activity>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, customer_id, kind, detail, created_at
                 FROM activities WHERE customer_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![customer_id], |row| {
                Ok(Activity {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    kind: row.get(2)?,
                    detail: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            let mut activities = Vec::new();
            for row in rows {
                activities.push(row?);
            }
            Ok(activities)
        })
        .await
        .map_err(crate::database::map_tr_err)
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
    async fn activities_append_in_order() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U-act")).await.unwrap();

        record(&db, customer.id, "unfollowed", None).await.unwrap();
        record(
            &db,
            customer.id,
            "note",
            Some(serde_json::json!({"text": "call back"})),
        )
        .await
        .unwrap();

        let activities = list_for_customer(&db, customer.id).await.unwrap();
        // The resolver already recorded 'created' as the first entry.
        assert_eq!(activities[0].kind, "created");
        assert_eq!(activities[1].kind, "unfollowed");
        assert_eq!(activities[2].kind, "note");
        db.close().await.unwrap();
    }
}
