// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental change feed over the message table.
//!
//! Every message mutation draws a version from the shared `feed_counter`
//! row, giving the whole table a total order. Clients track the highest
//! version they have seen and ask "what changed since V"; a client that has
//! never connected presents version 0.

use rusqlite::params;

use tsunagi_core::TsunagiError;

use crate::database::Database;
use crate::models::{ConversationSummary, Message};
use crate::queries::messages::{MESSAGE_COLUMNS, row_to_message};

/// The highest version assigned so far (0 on a fresh store).
pub async fn current_version(db: &Database) -> Result<i64, TsunagiError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT value FROM feed_counter WHERE id = 1", [], |row| {
                row.get(0)
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether anything changed past the client's version.
pub async fn needs_update(db: &Database, client_version: i64) -> Result<bool, TsunagiError> {
    Ok(current_version(db).await? > client_version)
}

/// All messages with version > `client_version`, optionally restricted to
/// one handle, ordered by version ascending, bounded to `max_batch` rows.
pub async fn changes_since(
    db: &Database,
    client_version: i64,
    handle: Option<&str>,
    max_batch: i64,
) -> Result<Vec<Message>, TsunagiError> {
    let handle = handle.map(|h| h.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut messages = Vec::new();
            match &handle {
                Some(handle) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE version > ?1 AND handle = ?2
                         ORDER BY version ASC LIMIT ?3"
                    ))?;
                    let rows = stmt
                        .query_map(params![client_version, handle, max_batch], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE version > ?1
                         ORDER BY version ASC LIMIT ?2"
                    ))?;
                    let rows =
                        stmt.query_map(params![client_version, max_batch], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Per-handle summaries for conversations touched past `client_version`.
///
/// Serves the `type=conversations` incremental diff: one row per affected
/// handle with its latest version and unread count.
pub async fn summaries_since(
    db: &Database,
    client_version: i64,
    handle: Option<&str>,
) -> Result<Vec<ConversationSummary>, TsunagiError> {
    let handle = handle.map(|h| h.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<ConversationSummary>, rusqlite::Error> {
            let filter = match handle {
                Some(_) => "AND m.handle = ?2",
                None => "",
            };
            let sql = format!(
                "SELECT m.handle, m.customer_id, c.display_name,
                        MAX(m.version) AS last_version,
                        SUM(CASE WHEN m.status = 'unread' AND m.from_customer = 1
                            THEN 1 ELSE 0 END) AS unread_count
                 FROM messages m
                 JOIN customers c ON c.id = m.customer_id
                 WHERE m.handle IN (
                     SELECT DISTINCT handle FROM messages WHERE version > ?1
                 ) {filter}
                 GROUP BY m.handle, m.customer_id, c.display_name
                 ORDER BY last_version ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let map_row = |row: &rusqlite::Row<'_>| {
                Ok(ConversationSummary {
                    handle: row.get(0)?,
                    customer_id: row.get(1)?,
                    display_name: row.get(2)?,
                    last_version: row.get(3)?,
                    unread_count: row.get(4)?,
                })
            };
            let mut summaries = Vec::new();
            match &handle {
                Some(h) => {
                    let rows = stmt.query_map(params![client_version, h], map_row)?;
                    for row in rows {
                        summaries.push(row?);
                    }
                }
                None => {
                    let rows = stmt.query_map(params![client_version], map_row)?;
                    for row in rows {
                        summaries.push(row?);
                    }
                }
            }
            Ok(summaries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMessage;
    use crate::queries::messages::{insert_message, update_status};
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
    async fn fresh_store_is_at_version_zero() {
        let (db, _dir) = setup_db().await;
        assert_eq!(current_version(&db).await.unwrap(), 0);
        assert!(!needs_update(&db, 0).await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn versions_are_consecutive_with_no_gaps_or_duplicates() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U-v")).await.unwrap();

        for i in 0..10 {
            insert_message(&db, make_msg(customer.id, "U-v", &format!("m{i}")))
                .await
                .unwrap();
        }

        let changes = changes_since(&db, 0, None, 200).await.unwrap();
        let versions: Vec<i64> = changes.iter().map(|m| m.version).collect();
        let expected: Vec<i64> = (1..=10).collect();
        assert_eq!(versions, expected);
        assert_eq!(current_version(&db).await.unwrap(), 10);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn changes_since_respects_client_version_and_filter() {
        let (db, _dir) = setup_db().await;
        let a = resolve(&db, ResolveRequest::new("U-a")).await.unwrap();
        let b = resolve(&db, ResolveRequest::new("U-b")).await.unwrap();

        insert_message(&db, make_msg(a.id, "U-a", "a1")).await.unwrap();
        insert_message(&db, make_msg(b.id, "U-b", "b1")).await.unwrap();
        insert_message(&db, make_msg(a.id, "U-a", "a2")).await.unwrap();

        let all = changes_since(&db, 1, None, 200).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_a = changes_since(&db, 0, Some("U-a"), 200).await.unwrap();
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|m| m.handle == "U-a"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn batch_size_is_bounded() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U-big")).await.unwrap();
        for i in 0..8 {
            insert_message(&db, make_msg(customer.id, "U-big", &format!("m{i}")))
                .await
                .unwrap();
        }

        let bounded = changes_since(&db, 0, None, 3).await.unwrap();
        assert_eq!(bounded.len(), 3);
        assert_eq!(bounded[0].version, 1);
        assert_eq!(bounded[2].version, 3);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_mutation_shows_up_in_the_feed() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U-s")).await.unwrap();
        let (id, v1) = insert_message(&db, make_msg(customer.id, "U-s", "hello"))
            .await
            .unwrap();

        update_status(&db, id, "read").await.unwrap();

        let changes = changes_since(&db, v1, None, 200).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, id);
        assert_eq!(changes[0].status, "read");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn summaries_report_unread_counts() {
        let (db, _dir) = setup_db().await;
        let customer = resolve(&db, ResolveRequest::new("U-sum")).await.unwrap();

        insert_message(&db, make_msg(customer.id, "U-sum", "one"))
            .await
            .unwrap();
        let (id, _) = insert_message(&db, make_msg(customer.id, "U-sum", "two"))
            .await
            .unwrap();
        update_status(&db, id, "read").await.unwrap();

        let summaries = summaries_since(&db, 0, None).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].handle, "U-sum");
        assert_eq!(summaries[0].unread_count, 1);
        assert_eq!(
            summaries[0].last_version,
            current_version(&db).await.unwrap()
        );
        db.close().await.unwrap();
    }
}
