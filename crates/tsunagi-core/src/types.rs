// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Tsunagi workspace.
//!
//! The string forms produced by `Display` are the exact values stored in the
//! SQLite CHECK-constrained columns; keep them in sync with the migrations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Media,
    Sticker,
    Location,
    System,
}

/// Delivery/read status of a conversation message.
///
/// Inbound messages start `unread` and move to `read`/`replied`; outbound
/// messages are created `sent` and move to `failed` on delivery error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Unread,
    Read,
    Replied,
    Sent,
    Failed,
}

impl MessageStatus {
    /// The known-safe value used when the schema rejects an attempted status.
    ///
    /// `unread` has been part of the status domain since the first migration,
    /// so it survives a code/schema drift in either direction.
    pub fn fallback() -> Self {
        MessageStatus::Unread
    }
}

/// Typed channel identifier kind used for cross-channel identity unification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Line,
    Phone,
    Email,
}

/// Lifecycle state of a customer identity.
///
/// Customers are never hard-deleted; archival is a state transition and so
/// is restoration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CustomerState {
    Active,
    Archived,
}

/// Abbreviated, denormalized projection of a conversation message held in
/// the realtime mirror for low-latency UI reads.
///
/// Not authoritative: the relational row is. A mirror entry may lag or be
/// absent without violating correctness, only user-facing freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorEntry {
    /// Authoritative message id as a string, or a `tmp-` prefixed
    /// placeholder before the relational write has assigned one.
    pub id: String,
    pub kind: MessageKind,
    /// Short text excerpt for list rendering.
    pub excerpt: String,
    pub from_customer: bool,
    pub status: MessageStatus,
    /// Global feed version; 0 until the authoritative write assigns one.
    pub version: i64,
    /// ISO 8601 timestamp of the message.
    pub occurred_at: String,
}

/// A change event handed to the [`crate::traits::ChangeNotifier`] after a
/// successful authoritative write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotice {
    /// Platform handle of the affected conversation.
    pub handle: String,
    /// Feed version assigned to the mutation.
    pub version: i64,
    pub kind: MessageKind,
}
