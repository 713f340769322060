// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event dispatch over decoded webhook batches.
//!
//! Each event is handled independently: an exception in one event is
//! recorded as a failed result for that event only and never aborts the
//! rest of the batch. The gateway returns HTTP 200 to the platform even
//! when individual events failed; failures surface through these results
//! and the logs, not through HTTP status.

use std::sync::Arc;

use chrono::{Days, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use tsunagi_config::model::CrmConfig;
use tsunagi_core::TsunagiError;
use tsunagi_core::traits::{ChangeNotifier, MirrorStore};
use tsunagi_core::types::{IdentifierKind, MessageKind};
use tsunagi_line::{LineClient, MessageContent, WebhookBatch, WebhookEvent};
use tsunagi_storage::models::NewMessage;
use tsunagi_storage::queries::{activities, customers, identifiers, leads};
use tsunagi_storage::resolver::{ResolveRequest, resolve_with_fallback};
use tsunagi_storage::Database;

use crate::referral::{ReferralTag, classify_referral, extract_phones};
use crate::writer;

/// Result of processing one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventResult {
    /// Event classification, e.g. `message/text`, `follow`.
    pub event: String,
    /// `ok`, `skipped` or `failed`.
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EventResult {
    fn ok(event: &str, detail: Option<String>) -> Self {
        Self {
            event: event.to_string(),
            result: "ok".to_string(),
            detail,
        }
    }

    fn skipped(event: &str, detail: &str) -> Self {
        Self {
            event: event.to_string(),
            result: "skipped".to_string(),
            detail: Some(detail.to_string()),
        }
    }

    fn failed(event: &str, detail: String) -> Self {
        Self {
            event: event.to_string(),
            result: "failed".to_string(),
            detail: Some(detail),
        }
    }
}

/// Result of processing one webhook batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub execution_id: String,
    pub events_processed: usize,
    pub events_results: Vec<EventResult>,
}

/// The ingestion pipeline: identity enrichment, dispatch, dual-store writes.
pub struct IngestPipeline {
    db: Database,
    mirror: Arc<dyn MirrorStore>,
    notifier: Arc<dyn ChangeNotifier>,
    line: LineClient,
    follow_up_days: u64,
}

impl IngestPipeline {
    pub fn new(
        db: Database,
        mirror: Arc<dyn MirrorStore>,
        notifier: Arc<dyn ChangeNotifier>,
        line: LineClient,
        crm: &CrmConfig,
    ) -> Self {
        Self {
            db,
            mirror,
            notifier,
            line,
            follow_up_days: crm.follow_up_days.max(0) as u64,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn mirror(&self) -> &Arc<dyn MirrorStore> {
        &self.mirror
    }

    pub fn notifier(&self) -> &Arc<dyn ChangeNotifier> {
        &self.notifier
    }

    pub fn line(&self) -> &LineClient {
        &self.line
    }

    /// Process a verified webhook batch, isolating per-event failures.
    pub async fn process_batch(&self, batch: WebhookBatch) -> BatchResult {
        let execution_id = Uuid::new_v4().to_string();
        let mut results = Vec::with_capacity(batch.events.len());

        for event in batch.events {
            let label = event_label(&event);
            match self.handle_event(event).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        execution_id = execution_id.as_str(),
                        event = label.as_str(),
                        error = %e,
                        "event processing failed, batch continues"
                    );
                    results.push(EventResult::failed(&label, e.to_string()));
                }
            }
        }

        BatchResult {
            execution_id,
            events_processed: results.len(),
            events_results: results,
        }
    }

    async fn handle_event(&self, event: WebhookEvent) -> Result<EventResult, TsunagiError> {
        match event {
            WebhookEvent::Message { .. } => self.handle_message(event).await,
            WebhookEvent::Follow { source, .. } => {
                let Some(handle) = source.user_id.as_deref() else {
                    return Ok(EventResult::skipped("follow", "no userId on source"));
                };
                self.handle_follow(handle).await
            }
            WebhookEvent::Unfollow { source, .. } => {
                let Some(handle) = source.user_id.as_deref() else {
                    return Ok(EventResult::skipped("unfollow", "no userId on source"));
                };
                self.handle_unfollow(handle).await
            }
            WebhookEvent::Unknown => Ok(EventResult::skipped("unknown", "unhandled event type")),
        }
    }

    async fn handle_message(&self, event: WebhookEvent) -> Result<EventResult, TsunagiError> {
        let label = event_label(&event);
        let occurred_at = event.occurred_at();
        let WebhookEvent::Message {
            source,
            message,
            reply_token,
            timestamp,
        } = event
        else {
            return Ok(EventResult::skipped(&label, "not a message event"));
        };

        let Some(handle) = source.user_id.as_deref() else {
            return Ok(EventResult::skipped(&label, "no userId on source"));
        };
        let customer = self.resolve_sender(handle).await?;

        // Referral classification annotates metadata but never suppresses
        // normal persistence.
        if let MessageContent::Text { text, .. } = &message {
            match classify_referral(text) {
                Some(ReferralTag::Code(code)) => {
                    customers::merge_source_meta(
                        &self.db,
                        customer.id,
                        serde_json::json!({ "referral_code": code }),
                    )
                    .await?;
                }
                Some(ReferralTag::Skip) => {
                    customers::merge_source_meta(
                        &self.db,
                        customer.id,
                        serde_json::json!({ "referral_skipped": true }),
                    )
                    .await?;
                }
                None => {}
            }
        }

        let (kind, content) = encode_content(&message);
        let meta = serde_json::json!({
            "line_message_id": message.message_id(),
            "raw_timestamp": timestamp,
            "reply_token": reply_token,
            "event": label,
        });

        let stored = writer::write_message(
            &self.db,
            &self.mirror,
            &self.notifier,
            NewMessage {
                customer_id: customer.id,
                staff_id: None,
                handle: handle.to_string(),
                kind: kind.to_string(),
                content,
                occurred_at,
                from_customer: true,
                status: "unread".to_string(),
                meta: Some(meta.to_string()),
            },
        )
        .await?;

        Ok(EventResult::ok(
            &label,
            Some(format!("message {} v{}", stored.id, stored.version)),
        ))
    }

    async fn handle_follow(&self, handle: &str) -> Result<EventResult, TsunagiError> {
        let customer = self.resolve_sender(handle).await?;

        customers::update_reachable(&self.db, customer.id, true).await?;

        let follow_up = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(self.follow_up_days))
            .unwrap_or_else(|| Utc::now().date_naive())
            .format("%Y-%m-%d")
            .to_string();
        customers::set_follow_up(&self.db, customer.id, &follow_up).await?;

        let lead = leads::create_if_absent(
            &self.db,
            customer.id,
            handle,
            "line",
            "Auto-created on LINE follow; schedule first contact",
        )
        .await?;

        activities::record(
            &self.db,
            customer.id,
            "followed",
            Some(serde_json::json!({ "handle": handle, "follow_up": follow_up })),
        )
        .await?;

        info!(
            handle,
            customer_id = customer.id,
            lead_created = lead.is_some(),
            "follow processed"
        );
        let detail = match lead {
            Some(id) => format!("lead {id} created"),
            None => "pending lead already open".to_string(),
        };
        Ok(EventResult::ok("follow", Some(detail)))
    }

    async fn handle_unfollow(&self, handle: &str) -> Result<EventResult, TsunagiError> {
        let line_kind = IdentifierKind::Line.to_string();
        let Some(customer_id) = identifiers::find_customer_id(&self.db, &line_kind, handle).await?
        else {
            // Unknown handles are logged and ignored; nothing to mark.
            warn!(handle, "unfollow for unknown handle ignored");
            return Ok(EventResult::skipped("unfollow", "unknown handle"));
        };

        customers::update_reachable(&self.db, customer_id, false).await?;
        activities::record(
            &self.db,
            customer_id,
            "unfollowed",
            Some(serde_json::json!({ "handle": handle })),
        )
        .await?;

        info!(handle, customer_id, "unfollow processed");
        Ok(EventResult::ok("unfollow", None))
    }

    /// Resolve the sender, enriched with a best-effort profile fetch.
    ///
    /// Profile failures degrade to a hint-free resolution; they never drop
    /// the event.
    async fn resolve_sender(
        &self,
        handle: &str,
    ) -> Result<tsunagi_storage::models::Customer, TsunagiError> {
        let mut req = ResolveRequest::new(handle);
        match self.line.fetch_profile(handle).await {
            Ok(profile) => {
                req = req.with_display_name(&profile.display_name);
                let free_text = format!(
                    "{} {}",
                    profile.display_name,
                    profile.status_message.as_deref().unwrap_or("")
                );
                for phone in extract_phones(&free_text) {
                    req = req.with_hint(IdentifierKind::Phone, &phone);
                }
            }
            Err(e) => {
                tracing::debug!(handle, error = %e, "profile fetch failed, resolving without hints");
            }
        }
        resolve_with_fallback(&self.db, req).await
    }
}

/// Stable classification label for an event, used in results and metadata.
fn event_label(event: &WebhookEvent) -> String {
    match event {
        WebhookEvent::Message { message, .. } => {
            let kind = match message {
                MessageContent::Text { .. } => "text",
                MessageContent::Image { .. }
                | MessageContent::Video { .. }
                | MessageContent::Audio { .. }
                | MessageContent::File { .. } => "media",
                MessageContent::Sticker { .. } => "sticker",
                MessageContent::Location { .. } => "location",
                MessageContent::Unknown => "system",
            };
            format!("message/{kind}")
        }
        WebhookEvent::Follow { .. } => "follow".to_string(),
        WebhookEvent::Unfollow { .. } => "unfollow".to_string(),
        WebhookEvent::Unknown => "unknown".to_string(),
    }
}

/// Map a decoded message body onto (storage kind, content serialization).
fn encode_content(message: &MessageContent) -> (MessageKind, String) {
    match message {
        MessageContent::Text { text, .. } => (MessageKind::Text, text.clone()),
        MessageContent::Image { id } => (
            MessageKind::Media,
            serde_json::json!({ "media": "image", "id": id }).to_string(),
        ),
        MessageContent::Video { id } => (
            MessageKind::Media,
            serde_json::json!({ "media": "video", "id": id }).to_string(),
        ),
        MessageContent::Audio { id } => (
            MessageKind::Media,
            serde_json::json!({ "media": "audio", "id": id }).to_string(),
        ),
        MessageContent::File { id, file_name } => (
            MessageKind::Media,
            serde_json::json!({ "media": "file", "id": id, "file_name": file_name }).to_string(),
        ),
        MessageContent::Sticker {
            package_id,
            sticker_id,
            ..
        } => (
            MessageKind::Sticker,
            serde_json::json!({ "package_id": package_id, "sticker_id": sticker_id }).to_string(),
        ),
        MessageContent::Location {
            title,
            address,
            latitude,
            longitude,
            ..
        } => (
            MessageKind::Location,
            serde_json::json!({
                "title": title,
                "address": address,
                "latitude": latitude,
                "longitude": longitude,
            })
            .to_string(),
        ),
        MessageContent::Unknown => (
            MessageKind::System,
            serde_json::json!({ "unhandled": true }).to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tsunagi_config::model::{LineConfig, StorageConfig};
    use tsunagi_storage::feed;
    use tsunagi_storage::queries::messages;
    use tsunagi_storage::resolver::resolve;
    use tsunagi_test_utils::{MockMirror, MockNotifier};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        pipeline: IngestPipeline,
        mirror: Arc<MockMirror>,
        notifier: Arc<MockNotifier>,
        _dir: tempfile::TempDir,
    }

    /// Build a pipeline against a temp database. With `api_base = None` the
    /// LINE client has no token and profile enrichment degrades gracefully.
    async fn make_harness(api_base: Option<&str>) -> Harness {
        let dir = tempdir().unwrap();
        let storage = StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let db = Database::open(&storage).await.unwrap();
        let mirror = Arc::new(MockMirror::new());
        let notifier = Arc::new(MockNotifier::new());
        let line = LineClient::new(&LineConfig {
            channel_secret: None,
            channel_token: api_base.map(|_| "tok".to_string()),
            api_base: api_base.unwrap_or("http://127.0.0.1:1").to_string(),
            allow_unsigned: true,
        });
        let pipeline = IngestPipeline::new(
            db,
            mirror.clone(),
            notifier.clone(),
            line,
            &CrmConfig { follow_up_days: 3 },
        );
        Harness {
            pipeline,
            mirror,
            notifier,
            _dir: dir,
        }
    }

    fn parse_batch(json: &str) -> WebhookBatch {
        serde_json::from_str(json).unwrap()
    }

    fn text_event(handle: &str, text: &str) -> String {
        format!(
            r#"{{"type": "message", "timestamp": 1740787200000,
                 "source": {{"type": "user", "userId": "{handle}"}},
                 "replyToken": "rt-1",
                 "message": {{"type": "text", "id": "m-1", "text": "{text}"}}}}"#
        )
    }

    #[tokio::test]
    async fn text_message_creates_identity_and_message() {
        let h = make_harness(None).await;
        let batch = parse_batch(&format!(r#"{{"events": [{}]}}"#, text_event("U123", "Hello")));

        let result = h.pipeline.process_batch(batch).await;
        assert_eq!(result.events_processed, 1);
        assert_eq!(result.events_results[0].result, "ok");
        assert_eq!(result.events_results[0].event, "message/text");

        let db = h.pipeline.database();
        let changes = feed::changes_since(db, 0, None, 200).await.unwrap();
        assert_eq!(changes.len(), 1);
        let msg = &changes[0];
        assert_eq!(msg.handle, "U123");
        assert_eq!(msg.kind, "text");
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.status, "unread");
        assert!(msg.from_customer);
        assert_eq!(feed::current_version(db).await.unwrap(), 1);

        // Customer exists with the handle bound; profile fetch failed so
        // the placeholder name is used.
        let owner = identifiers::find_customer_id(db, "line", "U123")
            .await
            .unwrap();
        assert!(owner.is_some());

        // Mirror reflects the message under its authoritative id.
        let entries = h.mirror.recent("U123").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, msg.id.to_string());
        assert_eq!(entries[0].excerpt, "Hello");

        // Broadcast was attempted.
        assert_eq!(h.notifier.count().await, 1);
    }

    #[tokio::test]
    async fn second_message_reuses_the_identity() {
        let h = make_harness(None).await;
        let batch = parse_batch(&format!(
            r#"{{"events": [{}, {}]}}"#,
            text_event("U123", "first"),
            text_event("U123", "second")
        ));
        h.pipeline.process_batch(batch).await;

        let db = h.pipeline.database();
        let changes = feed::changes_since(db, 0, None, 200).await.unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0].customer_id, changes[1].customer_id,
            "same sender must map to one customer"
        );
    }

    #[tokio::test]
    async fn batch_partial_failure_keeps_other_events() {
        let h = make_harness(None).await;
        let db = h.pipeline.database().clone();

        // Pre-resolve the two healthy senders, then break the activity log
        // so resolution of the unknown sender in event #2 fails outright
        // (both the full path and the minimal path record a 'created'
        // activity).
        resolve(&db, ResolveRequest::new("U-1")).await.unwrap();
        resolve(&db, ResolveRequest::new("U-3")).await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("DROP TABLE activities;")?;
                Ok(())
            })
            .await
            .unwrap();

        let batch = parse_batch(&format!(
            r#"{{"events": [{}, {{"type": "follow", "source": {{"userId": "U-2"}}}}, {}]}}"#,
            text_event("U-1", "one"),
            text_event("U-3", "three")
        ));
        let result = h.pipeline.process_batch(batch).await;

        assert_eq!(result.events_processed, 3);
        assert_eq!(result.events_results[0].result, "ok");
        assert_eq!(result.events_results[1].result, "failed");
        assert_eq!(result.events_results[2].result, "ok");

        let changes = feed::changes_since(&db, 0, None, 200).await.unwrap();
        assert_eq!(changes.len(), 2, "events #1 and #3 must be persisted");
    }

    #[tokio::test]
    async fn follow_creates_lead_and_schedules_follow_up() {
        let h = make_harness(None).await;
        let batch =
            parse_batch(r#"{"events": [{"type": "follow", "source": {"userId": "U-f"}}]}"#);
        let result = h.pipeline.process_batch(batch).await;
        assert_eq!(result.events_results[0].result, "ok");

        let db = h.pipeline.database();
        let customer_id = identifiers::find_customer_id(db, "line", "U-f")
            .await
            .unwrap()
            .unwrap();
        let customer = customers::get_customer(db, customer_id)
            .await
            .unwrap()
            .unwrap();
        assert!(customer.reachable);
        assert!(customer.follow_up_at.is_some());

        let leads = leads::list_for_customer(db, customer_id).await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].status, "pending");
        assert_eq!(leads[0].origin, "line");
        assert!(leads[0].note.as_deref().unwrap_or("").contains("follow"));

        // A second follow must not open a second pending lead.
        let batch =
            parse_batch(r#"{"events": [{"type": "follow", "source": {"userId": "U-f"}}]}"#);
        h.pipeline.process_batch(batch).await;
        let leads = leads::list_for_customer(db, customer_id).await.unwrap();
        assert_eq!(leads.len(), 1, "duplicate pending lead must be suppressed");
    }

    #[tokio::test]
    async fn unfollow_marks_unreachable_and_ignores_unknown_handles() {
        let h = make_harness(None).await;
        let db = h.pipeline.database();

        // Unknown handle: logged and ignored.
        let batch =
            parse_batch(r#"{"events": [{"type": "unfollow", "source": {"userId": "U-ghost"}}]}"#);
        let result = h.pipeline.process_batch(batch).await;
        assert_eq!(result.events_results[0].result, "skipped");
        assert!(
            identifiers::find_customer_id(db, "line", "U-ghost")
                .await
                .unwrap()
                .is_none(),
            "unfollow must not create identities"
        );

        // Known handle: reachable flips off, audit entry appended.
        let customer = resolve(db, ResolveRequest::new("U-u")).await.unwrap();
        let batch =
            parse_batch(r#"{"events": [{"type": "unfollow", "source": {"userId": "U-u"}}]}"#);
        let result = h.pipeline.process_batch(batch).await;
        assert_eq!(result.events_results[0].result, "ok");

        let updated = customers::get_customer(db, customer.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.reachable);
        let log = activities::list_for_customer(db, customer.id).await.unwrap();
        assert!(log.iter().any(|a| a.kind == "unfollowed"));
    }

    #[tokio::test]
    async fn referral_code_annotates_metadata_without_suppressing_the_message() {
        let h = make_harness(None).await;
        let batch = parse_batch(&format!(r#"{{"events": [{}]}}"#, text_event("U-r", "AB123")));
        h.pipeline.process_batch(batch).await;

        let db = h.pipeline.database();
        let customer_id = identifiers::find_customer_id(db, "line", "U-r")
            .await
            .unwrap()
            .unwrap();
        let customer = customers::get_customer(db, customer_id)
            .await
            .unwrap()
            .unwrap();
        let meta: serde_json::Value =
            serde_json::from_str(customer.source_meta.as_deref().unwrap()).unwrap();
        assert_eq!(meta["referral_code"], "AB123");

        // The message itself is still persisted.
        let messages = messages::get_conversation(db, "U-r", 10, 0).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "AB123");
    }

    #[tokio::test]
    async fn skip_keyword_is_recorded() {
        let h = make_harness(None).await;
        let batch = parse_batch(&format!(r#"{{"events": [{}]}}"#, text_event("U-s", "skip")));
        h.pipeline.process_batch(batch).await;

        let db = h.pipeline.database();
        let customer_id = identifiers::find_customer_id(db, "line", "U-s")
            .await
            .unwrap()
            .unwrap();
        let customer = customers::get_customer(db, customer_id)
            .await
            .unwrap()
            .unwrap();
        let meta: serde_json::Value =
            serde_json::from_str(customer.source_meta.as_deref().unwrap()).unwrap();
        assert_eq!(meta["referral_skipped"], true);
    }

    #[tokio::test]
    async fn sticker_location_and_unknown_kinds_are_persisted() {
        let h = make_harness(None).await;
        let batch = parse_batch(
            r#"{"events": [
                {"type": "message", "source": {"userId": "U-k"},
                 "message": {"type": "sticker", "id": "m1", "packageId": "446", "stickerId": "1988"}},
                {"type": "message", "source": {"userId": "U-k"},
                 "message": {"type": "location", "id": "m2", "title": "Office",
                             "address": "x", "latitude": 35.0, "longitude": 139.0}},
                {"type": "message", "source": {"userId": "U-k"},
                 "message": {"type": "imagemap", "id": "m3"}}
            ]}"#,
        );
        let result = h.pipeline.process_batch(batch).await;
        assert!(result.events_results.iter().all(|r| r.result == "ok"));

        let db = h.pipeline.database();
        let messages = messages::get_conversation(db, "U-k", 10, 0).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].kind, "sticker");
        assert_eq!(messages[1].kind, "location");
        assert_eq!(messages[2].kind, "system");

        let content: serde_json::Value = serde_json::from_str(&messages[0].content).unwrap();
        assert_eq!(content["package_id"], "446");
    }

    #[tokio::test]
    async fn unknown_event_type_is_skipped_not_failed() {
        let h = make_harness(None).await;
        let batch = parse_batch(
            r#"{"events": [{"type": "postback", "source": {"userId": "U1"}, "postback": {}}]}"#,
        );
        let result = h.pipeline.process_batch(batch).await;
        assert_eq!(result.events_processed, 1);
        assert_eq!(result.events_results[0].result, "skipped");
        assert!(!result.execution_id.is_empty());
    }

    #[tokio::test]
    async fn profile_phone_hint_unifies_with_a_web_form_customer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/profile/U-merge"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "displayName": "Hanako",
                "userId": "U-merge",
                "statusMessage": "loan inquiry 0912345678"
            })))
            .mount(&server)
            .await;

        let h = make_harness(Some(&server.uri())).await;
        let db = h.pipeline.database().clone();

        // Seed a customer the web-form channel created earlier.
        let web_id = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO customers (display_name, channel) VALUES ('Hanako', 'web')",
                    [],
                )?;
                let id = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO identifiers (kind, value, customer_id)
                     VALUES ('phone', '0912345678', ?1)",
                    rusqlite::params![id],
                )?;
                tx.commit()?;
                Ok(id)
            })
            .await
            .unwrap();

        let batch = parse_batch(&format!(
            r#"{{"events": [{}]}}"#,
            text_event("U-merge", "Hello again")
        ));
        h.pipeline.process_batch(batch).await;

        // The message attached to the existing web customer, not a new one.
        let changes = feed::changes_since(&db, 0, None, 200).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].customer_id, web_id);

        let log = activities::list_for_customer(&db, web_id).await.unwrap();
        assert!(log.iter().any(|a| a.kind == "channels_unified"));
    }
}
