// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loan lead operations.
//!
//! Leads are created when a customer follows the channel; duplicate
//! suppression guarantees at most one pending lead per (customer, handle).

use rusqlite::params;

use tsunagi_core::TsunagiError;

use crate::database::Database;
use crate::models::Lead;

/// Create a pending lead unless one already exists for (customer, handle).
///
/// The existence check and the insert run in one transaction. Returns the
/// created lead id, or `None` when a pending lead already existed.
pub async fn create_if_absent(
    db: &Database,
    customer_id: i64,
    handle: &str,
    origin: &str,
    note: &str,
) -> Result<Option<i64>, TsunagiError> {
    let handle = handle.to_string();
    let origin = origin.to_string();
    let note = note.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM leads
                 WHERE customer_id = ?1 AND handle = ?2 AND status = 'pending'",
                params![customer_id, handle],
                |row| row.get(0),
            )?;
            if existing > 0 {
                tx.commit()?;
                return Ok(None);
            }
            tx.execute(
                "INSERT INTO leads (customer_id, handle, status, origin, note)
                 VALUES (?1, ?2, 'pending', ?3, ?4)",
                params![customer_id, handle, origin, note],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Some(id))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a customer's leads, newest first.
pub async fn list_for_customer(
    db: &Database,
    customer_id: i64,
) -> Result<Vec<Lead>, TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Lead>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, customer_id, handle, status, origin, note, created_at
                 FROM leads WHERE customer_id = ?1 ORDER BY id DESC",
            )?;
            let rows = stmt.query_map(params![customer_id], |row| {
                Ok(Lead {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    handle: row.get(2)?,
                    status: row.get(3)?,
                    origin: row.get(4)?,
                    note: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            let mut leads = Vec::new();
            for row in rows {
                leads.push(row?);
            }
            Ok(leads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
