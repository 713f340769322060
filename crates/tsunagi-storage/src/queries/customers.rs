// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer identity read and update operations.
//!
//! Creation and archival-restore run inside the identity resolver's
//! transaction; this module covers the operations that happen after a
//! customer exists.

use rusqlite::params;

use tsunagi_core::TsunagiError;

use crate::database::Database;
use crate::models::Customer;

pub(crate) const CUSTOMER_COLUMNS: &str = "id, display_name, channel, assigned_staff, state, \
     reachable, follow_up_at, source_meta, created_at, updated_at";

pub(crate) fn row_to_customer(row: &rusqlite::Row<'_>) -> Result<Customer, rusqlite::Error> {
    Ok(Customer {
        id: row.get(0)?,
        display_name: row.get(1)?,
        channel: row.get(2)?,
        assigned_staff: row.get(3)?,
        state: row.get(4)?,
        reachable: row.get::<_, i64>(5)? != 0,
        follow_up_at: row.get(6)?,
        source_meta: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Get a customer by id.
pub async fn get_customer(db: &Database, id: i64) -> Result<Option<Customer>, TsunagiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_customer);
            match result {
                Ok(customer) => Ok(Some(customer)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set whether the customer is reachable on its channel.
pub async fn update_reachable(
    db: &Database,
    id: i64,
    reachable: bool,
) -> Result<(), TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE customers SET reachable = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![reachable as i64, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Schedule a follow-up contact date.
pub async fn set_follow_up(
    db: &Database,
    id: i64,
    follow_up_at: &str,
) -> Result<(), TsunagiError> {
    let follow_up_at = follow_up_at.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE customers SET follow_up_at = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![follow_up_at, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge a JSON object into the customer's source metadata.
///
/// Existing keys not present in `patch` are preserved; keys in `patch`
/// overwrite. A non-object or unparsable stored document is replaced.
pub async fn merge_source_meta(
    db: &Database,
    id: i64,
    patch: serde_json::Value,
) -> Result<(), TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<(), tokio_rusqlite::Error> {
            let tx = conn.transaction()?;
            let current: Option<String> = {
                let result = tx.query_row(
                    "SELECT source_meta FROM customers WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => value,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(()),
                    Err(e) => return Err(e.into()),
                }
            };

            let mut merged = current
                .as_deref()
                .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
                .filter(|v| v.is_object())
                .unwrap_or_else(|| serde_json::json!({}));
            if let (Some(target), Some(source)) = (merged.as_object_mut(), patch.as_object()) {
                for (key, value) in source {
                    target.insert(key.clone(), value.clone());
                }
            }

            tx.execute(
                "UPDATE customers SET source_meta = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![merged.to_string(), id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
