// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound staff replies.
//!
//! Delivery to the platform is attempted before and independent of any
//! store write. A delivery failure is recorded as the terminal `failed`
//! status on the persisted message; there is no automatic retry, the staff
//! UI surfaces it for manual action. The message row exists either way so
//! the conversation history stays complete.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use tsunagi_core::TsunagiError;
use tsunagi_core::traits::{ChangeNotifier, MirrorStore};
use tsunagi_core::types::MessageStatus;
use tsunagi_line::LineClient;
use tsunagi_storage::models::NewMessage;
use tsunagi_storage::resolver::{ResolveRequest, resolve_with_fallback};
use tsunagi_storage::Database;

use crate::writer::{self, StoredMessage};

/// Outcome of an outbound reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundResult {
    pub id: i64,
    pub version: i64,
    /// Whether the platform accepted the delivery.
    pub delivered: bool,
}

/// Deliver a staff reply and persist it through the dual-store writer.
pub async fn send_reply(
    db: &Database,
    mirror: &Arc<dyn MirrorStore>,
    notifier: &Arc<dyn ChangeNotifier>,
    line: &LineClient,
    handle: &str,
    text: &str,
    staff_id: Option<&str>,
) -> Result<OutboundResult, TsunagiError> {
    let customer = resolve_with_fallback(db, ResolveRequest::new(handle)).await?;

    let delivered = match line.push_text(handle, text).await {
        Ok(()) => true,
        Err(e) => {
            warn!(handle, error = %e, "push delivery failed, recording terminal status");
            false
        }
    };
    let status = if delivered {
        MessageStatus::Sent
    } else {
        MessageStatus::Failed
    };

    let StoredMessage { id, version } = writer::write_message(
        db,
        mirror,
        notifier,
        NewMessage {
            customer_id: customer.id,
            staff_id: staff_id.map(|s| s.to_string()),
            handle: handle.to_string(),
            kind: "text".to_string(),
            content: text.to_string(),
            occurred_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            from_customer: false,
            status: status.to_string(),
            meta: Some(serde_json::json!({ "event": "outbound/reply" }).to_string()),
        },
    )
    .await?;

    info!(handle, message_id = id, delivered, "reply persisted");
    Ok(OutboundResult {
        id,
        version,
        delivered,
    })
}
