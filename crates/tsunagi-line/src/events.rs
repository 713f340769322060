// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook event model.
//!
//! LINE's event JSON varies by type; it is decoded as a tagged union with
//! unknown kinds landing in explicit `Unknown` variants instead of failing
//! the batch parse. One undecodable or unhandled event must never take the
//! rest of the batch down with it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

/// A webhook delivery: one batch of events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBatch {
    /// Bot user id the delivery was addressed to.
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// Origin of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// One webhook event, discriminated on its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Message {
        #[serde(default)]
        timestamp: Option<i64>,
        source: EventSource,
        message: MessageContent,
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
    },
    Follow {
        #[serde(default)]
        timestamp: Option<i64>,
        source: EventSource,
    },
    Unfollow {
        #[serde(default)]
        timestamp: Option<i64>,
        source: EventSource,
    },
    /// Any event type this build does not handle (join, postback, beacon, ...).
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    /// The sender's platform handle, when the event carries one.
    pub fn handle(&self) -> Option<&str> {
        match self {
            WebhookEvent::Message { source, .. }
            | WebhookEvent::Follow { source, .. }
            | WebhookEvent::Unfollow { source, .. } => source.user_id.as_deref(),
            WebhookEvent::Unknown => None,
        }
    }

    /// Platform-reported event time as ISO 8601, falling back to receipt
    /// time when the timestamp is absent or out of range.
    pub fn occurred_at(&self) -> String {
        let timestamp = match self {
            WebhookEvent::Message { timestamp, .. }
            | WebhookEvent::Follow { timestamp, .. }
            | WebhookEvent::Unfollow { timestamp, .. } => *timestamp,
            WebhookEvent::Unknown => None,
        };
        timestamp
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Message body, discriminated on its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        #[serde(default)]
        id: Option<String>,
        text: String,
    },
    Image {
        #[serde(default)]
        id: Option<String>,
    },
    Video {
        #[serde(default)]
        id: Option<String>,
    },
    Audio {
        #[serde(default)]
        id: Option<String>,
    },
    File {
        #[serde(default)]
        id: Option<String>,
        #[serde(rename = "fileName", default)]
        file_name: Option<String>,
    },
    Sticker {
        #[serde(default)]
        id: Option<String>,
        #[serde(rename = "packageId")]
        package_id: String,
        #[serde(rename = "stickerId")]
        sticker_id: String,
    },
    Location {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    /// Any message type this build does not handle.
    #[serde(other)]
    Unknown,
}

impl MessageContent {
    /// The platform's message id, when present.
    pub fn message_id(&self) -> Option<&str> {
        match self {
            MessageContent::Text { id, .. }
            | MessageContent::Image { id }
            | MessageContent::Video { id }
            | MessageContent::Audio { id }
            | MessageContent::File { id, .. }
            | MessageContent::Sticker { id, .. }
            | MessageContent::Location { id, .. } => id.as_deref(),
            MessageContent::Unknown => None,
        }
    }
}
