// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the authoritative store.
//!
//! Kind/status/state columns are kept as strings at this layer, matching the
//! CHECK-constrained TEXT columns they map to; the typed enums in
//! `tsunagi-core` are converted at the call sites that construct rows.

use serde::{Deserialize, Serialize};

/// A durable customer identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub display_name: String,
    /// Origin channel tag ('line', 'web', ...).
    pub channel: String,
    /// Owning staff member, or `None` while unassigned.
    pub assigned_staff: Option<String>,
    /// Lifecycle state: 'active' or 'archived'. Never hard-deleted.
    pub state: String,
    /// Whether the customer is currently reachable on its channel.
    pub reachable: bool,
    /// Scheduled follow-up date (ISO 8601), if any.
    pub follow_up_at: Option<String>,
    /// Free-form source metadata as a JSON document.
    pub source_meta: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A typed (kind, value) channel identifier owned by one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub id: i64,
    /// 'line', 'phone' or 'email'.
    pub kind: String,
    pub value: String,
    pub customer_id: i64,
    pub created_at: String,
}

/// An authoritative conversation message row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub customer_id: i64,
    pub staff_id: Option<String>,
    /// Platform-specific sender handle.
    pub handle: String,
    /// 'text', 'media', 'sticker', 'location' or 'system'.
    pub kind: String,
    /// Platform-specific serialization of the message body.
    pub content: String,
    /// Platform-reported timestamp, falling back to receipt time.
    pub occurred_at: String,
    pub from_customer: bool,
    /// 'unread', 'read', 'replied', 'sent' or 'failed'.
    pub status: String,
    /// Global feed version; strictly increasing across the whole table.
    pub version: i64,
    /// JSON metadata: original platform message id, raw timestamp, event
    /// classification.
    pub meta: Option<String>,
    pub created_at: String,
}

/// Field set for inserting a message; id, version and created_at are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub customer_id: i64,
    pub staff_id: Option<String>,
    pub handle: String,
    pub kind: String,
    pub content: String,
    pub occurred_at: String,
    pub from_customer: bool,
    pub status: String,
    pub meta: Option<String>,
}

/// An open loan lead created on first contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub customer_id: i64,
    pub handle: String,
    pub status: String,
    /// Channel that originated the lead.
    pub origin: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// An append-only audit event on a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub customer_id: i64,
    /// 'created', 'channels_unified', 'restored', 'unfollowed', ...
    pub kind: String,
    /// JSON detail payload.
    pub detail: Option<String>,
    pub created_at: String,
}

/// Per-handle conversation summary served by the incremental diff API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub handle: String,
    pub customer_id: i64,
    pub display_name: String,
    /// Highest feed version among the conversation's messages.
    pub last_version: i64,
    /// Count of unread from-customer messages.
    pub unread_count: i64,
}
