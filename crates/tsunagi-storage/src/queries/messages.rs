// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation message operations.
//!
//! Every mutation (insert and status update alike) advances the global
//! feed counter inside its own transaction, so the change feed observes a
//! strictly increasing, gap-free version sequence.

use rusqlite::params;
use tracing::warn;

use tsunagi_core::TsunagiError;
use tsunagi_core::types::MessageStatus;

use crate::database::Database;
use crate::models::{Message, NewMessage};

pub(crate) const MESSAGE_COLUMNS: &str = "id, customer_id, staff_id, handle, kind, content, \
     occurred_at, from_customer, status, version, meta, created_at";

pub(crate) fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        staff_id: row.get(2)?,
        handle: row.get(3)?,
        kind: row.get(4)?,
        content: row.get(5)?,
        occurred_at: row.get(6)?,
        from_customer: row.get::<_, i64>(7)? != 0,
        status: row.get(8)?,
        version: row.get(9)?,
        meta: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Advance the shared feed counter and return the new version.
///
/// Runs inside the caller's transaction so the version assignment commits
/// or rolls back atomically with the row mutation. UPDATE ... RETURNING is
/// the atomic-increment primitive; never read-then-write.
pub(crate) fn next_version(tx: &rusqlite::Transaction<'_>) -> Result<i64, rusqlite::Error> {
    tx.query_row(
        "UPDATE feed_counter SET value = value + 1 WHERE id = 1 RETURNING value",
        [],
        |row| row.get(0),
    )
}

/// Insert a message, assigning its feed version atomically.
///
/// Returns `(message_id, version)`.
pub async fn insert_message(db: &Database, msg: NewMessage) -> Result<(i64, i64), TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<(i64, i64), rusqlite::Error> {
            let tx = conn.transaction()?;
            let version = next_version(&tx)?;
            tx.execute(
                "INSERT INTO messages (customer_id, staff_id, handle, kind, content,
                                       occurred_at, from_customer, status, version, meta)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    msg.customer_id,
                    msg.staff_id,
                    msg.handle,
                    msg.kind,
                    msg.content,
                    msg.occurred_at,
                    msg.from_customer as i64,
                    msg.status,
                    version,
                    msg.meta,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok((id, version))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a message by id.
pub async fn get_message(db: &Database, id: i64) -> Result<Option<Message>, TsunagiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_message);
            match result {
                Ok(message) => Ok(Some(message)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages for one handle in feed order, with limit/offset paging.
pub async fn get_conversation(
    db: &Database,
    handle: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, TsunagiError> {
    let handle = handle.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE handle = ?1 ORDER BY version ASC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![handle, limit, offset], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a message's status, assigning a new feed version.
///
/// Tolerates a status domain drift between code and schema: when the CHECK
/// constraint rejects the attempted value, the update is retried once with
/// the known-safe fallback instead of dropping the write. Any other storage
/// error propagates. Returns the new version, or `None` when no such
/// message exists.
pub async fn update_status(
    db: &Database,
    id: i64,
    status: &str,
) -> Result<Option<i64>, TsunagiError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let version = next_version(&tx)?;

            let update = |value: &str| -> Result<usize, rusqlite::Error> {
                tx.execute(
                    "UPDATE messages SET status = ?1, version = ?2 WHERE id = ?3",
                    params![value, version, id],
                )
            };

            let changed = match update(&status) {
                Ok(n) => n,
                Err(e) if is_check_violation(&e) => {
                    // A CHECK failure aborts only the statement, so the
                    // transaction (and the version we drew) stays usable.
                    let fallback = MessageStatus::fallback().to_string();
                    warn!(
                        message_id = id,
                        attempted = status.as_str(),
                        fallback = fallback.as_str(),
                        "status rejected by schema, retrying with fallback"
                    );
                    update(&fallback)?
                }
                Err(e) => return Err(e),
            };

            if changed == 0 {
                // No such message; let the transaction drop to roll the
                // counter advance back.
                return Ok(None);
            }
            tx.commit()?;
            Ok(Some(version))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// True when the error is a CHECK-constraint rejection, the signature of an
/// enumerated status value the schema does not know.
fn is_check_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK
    )
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

    fn make_msg(customer_id: i64, handle: &str, content: &str) -> NewMessage {
        NewMessage {
            customer_id,
            staff_id: None,
            handle: handle.to_string(),
            kind: "text".to_string(),
            content: content.to_string(),
            occurred_at: "2026-03-01T00:00:01.000Z".to_string(),
            from_customer: true,
            status: "unread".to_string(),
            meta: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_consecutive_versions() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U1")).await.unwrap();

        let (_, v1) = insert_message(&db, make_msg(customer.id, "U1", "first"))
            .await
            .unwrap();
        let (_, v2) = insert_message(&db, make_msg(customer.id, "U1", "second"))
            .await
            .unwrap();
        let (_, v3) = insert_message(&db, make_msg(customer.id, "U1", "third"))
            .await
            .unwrap();

        assert_eq!(v2, v1 + 1);
        assert_eq!(v3, v2 + 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conversation_pages_in_feed_order() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U2")).await.unwrap();

        for i in 0..5 {
            insert_message(&db, make_msg(customer.id, "U2", &format!("msg {i}")))
                .await
                .unwrap();
        }

        let page = get_conversation(&db, "U2", 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "msg 1");
        assert_eq!(page[1].content, "msg 2");
        assert!(page[0].version < page[1].version);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_update_advances_version() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U3")).await.unwrap();
        let (id, v1) = insert_message(&db, make_msg(customer.id, "U3", "hello"))
            .await
            .unwrap();

        let v2 = update_status(&db, id, "read").await.unwrap().unwrap();
        assert!(v2 > v1);

        let message = get_message(&db, id).await.unwrap().unwrap();
        assert_eq!(message.status, "read");
        assert_eq!(message.version, v2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_status_falls_back_instead_of_dropping_the_write() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U4")).await.unwrap();
        let (id, _) = insert_message(&db, make_msg(customer.id, "U4", "hello"))
            .await
            .unwrap();

        // Mark read first so the fallback visibly changes the row back.
        update_status(&db, id, "read").await.unwrap();

        // A status value outside the schema's CHECK domain.
        let version = update_status(&db, id, "escalated").await.unwrap();
        assert!(version.is_some(), "fallback write should succeed");

        let message = get_message(&db, id).await.unwrap().unwrap();
        assert_eq!(message.status, "unread", "fallback value should be stored");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_update_on_missing_message_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = update_status(&db, 424242, "read").await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }
}
