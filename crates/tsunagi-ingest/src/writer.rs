// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dual-store write coordination: mirror-first, authoritative-second.
//!
//! The mirror write happens before the slower relational path so the live
//! UI sees the message with minimal latency, under a temporary id. The
//! relational insert is the only step that may fail the operation; its
//! transaction assigns the feed version. On success the temporary mirror
//! entry is superseded by one keyed by the authoritative id. A mirror
//! failure at either step is logged and leaves the mirror stale, never the
//! authoritative store wrong.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use tsunagi_core::TsunagiError;
use tsunagi_core::traits::{ChangeNotifier, MirrorStore};
use tsunagi_core::types::{ChangeNotice, MessageKind, MessageStatus, MirrorEntry};
use tsunagi_storage::models::NewMessage;
use tsunagi_storage::queries::messages;
use tsunagi_storage::Database;

/// Outcome of a dual-store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub version: i64,
}

/// Persist a message to both stores and broadcast the change.
///
/// Mirror failures never propagate past this function; the authoritative
/// write is the gate for "did this message really happen".
pub async fn write_message(
    db: &Database,
    mirror: &Arc<dyn MirrorStore>,
    notifier: &Arc<dyn ChangeNotifier>,
    msg: NewMessage,
) -> Result<StoredMessage, TsunagiError> {
    let handle = msg.handle.clone();
    let kind = MessageKind::from_str(&msg.kind).unwrap_or(MessageKind::System);
    let status = MessageStatus::from_str(&msg.status).unwrap_or_else(|_| MessageStatus::fallback());

    // Step 1: mirror write under a temporary id, never propagated.
    let temp_id = format!("tmp-{}", Uuid::new_v4());
    let mut entry = MirrorEntry {
        id: temp_id.clone(),
        kind,
        excerpt: excerpt_for(kind, &msg.content),
        from_customer: msg.from_customer,
        status,
        version: 0,
        occurred_at: msg.occurred_at.clone(),
    };
    let mirrored = match mirror.append(&handle, entry.clone()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(handle = handle.as_str(), error = %e, "mirror pre-write failed");
            false
        }
    };

    // Step 2: authoritative write. The only step that may fail the caller.
    let (id, version) = messages::insert_message(db, msg).await?;

    // Step 3: supersede the temporary entry with the authoritative id.
    if mirrored {
        entry.id = id.to_string();
        entry.version = version;
        if let Err(e) = mirror.supersede(&handle, &temp_id, entry).await {
            // Stale mirror is an acceptable degraded state.
            warn!(
                handle = handle.as_str(),
                message_id = id,
                error = %e,
                "mirror supersede failed, mirror is stale"
            );
        }
    }

    notifier
        .notify(ChangeNotice {
            handle: handle.clone(),
            version,
            kind,
        })
        .await;

    debug!(handle = handle.as_str(), message_id = id, version, "message stored");
    Ok(StoredMessage { id, version })
}

/// Short display excerpt for the mirror projection.
fn excerpt_for(kind: MessageKind, content: &str) -> String {
    match kind {
        MessageKind::Text => {
            let mut excerpt: String = content.chars().take(80).collect();
            if excerpt.len() < content.len() {
                excerpt.push('…');
            }
            excerpt
        }
        MessageKind::Media => "[media]".to_string(),
        MessageKind::Sticker => "[sticker]".to_string(),
        MessageKind::Location => "[location]".to_string(),
        MessageKind::System => "[system]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tsunagi_config::model::StorageConfig;
    use tsunagi_storage::resolver::{ResolveRequest, resolve};
    use tsunagi_test_utils::{MockMirror, MockNotifier};

    async fn setup() -> (
        Database,
        Arc<MockMirror>,
        Arc<MockNotifier>,
        tempfile::TempDir,
    ) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir
                .path()
                .join("test.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        (db, Arc::new(MockMirror::new()), Arc::new(MockNotifier::new()), dir)
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
    async fn write_lands_in_both_stores_with_the_authoritative_id() {
        let (db, mirror, notifier, _dir) = setup().await;
        let customer = resolve(&db, ResolveRequest::new("U1")).await.unwrap();

        let mirror_dyn: Arc<dyn MirrorStore> = mirror.clone();
        let notifier_dyn: Arc<dyn ChangeNotifier> = notifier.clone();
        let stored = write_message(&db, &mirror_dyn, &notifier_dyn, make_msg(customer.id, "U1", "Hello"))
            .await
            .unwrap();

        let entries = mirror.recent("U1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, stored.id.to_string(), "temp id superseded");
        assert_eq!(entries[0].version, stored.version);
        assert_eq!(entries[0].excerpt, "Hello");

        let notices = notifier.notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].version, stored.version);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mirror_failure_does_not_lose_the_authoritative_row() {
        let (db, mirror, notifier, _dir) = setup().await;
        let customer = resolve(&db, ResolveRequest::new("U2")).await.unwrap();
        mirror.set_failing(true);

        let mirror_dyn: Arc<dyn MirrorStore> = mirror.clone();
        let notifier_dyn: Arc<dyn ChangeNotifier> = notifier.clone();
        let stored = write_message(&db, &mirror_dyn, &notifier_dyn, make_msg(customer.id, "U2", "still here"))
            .await
            .expect("mirror failure must not fail the write");

        // Authoritative row exists and is visible to the change feed.
        let changes = tsunagi_storage::feed::changes_since(&db, 0, None, 200)
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, stored.id);
        assert_eq!(changes[0].content, "still here");

        // Notification still went out.
        assert_eq!(notifier.count().await, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn long_text_is_truncated_in_the_mirror_excerpt() {
        let (db, mirror, notifier, _dir) = setup().await;
        let customer = resolve(&db, ResolveRequest::new("U3")).await.unwrap();
        let long = "a".repeat(200);

        let mirror_dyn: Arc<dyn MirrorStore> = mirror.clone();
        let notifier_dyn: Arc<dyn ChangeNotifier> = notifier.clone();
        write_message(&db, &mirror_dyn, &notifier_dyn, make_msg(customer.id, "U3", &long))
            .await
            .unwrap();

        let entries = mirror.recent("U3").await.unwrap();
        assert!(entries[0].excerpt.chars().count() <= 81);
        assert!(entries[0].excerpt.ends_with('…'));

        db.close().await.unwrap();
    }
}
