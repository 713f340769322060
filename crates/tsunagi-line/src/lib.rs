// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LINE platform boundary.
//!
//! Everything that knows about LINE's wire formats lives here: webhook
//! signature verification, the inbound event model, and the outbound API
//! client (profile fetch, push delivery). The rest of the workspace deals
//! only in channel-agnostic types.

pub mod client;
pub mod events;
pub mod signature;

pub use client::{LineClient, Profile};
pub use events::{EventSource, MessageContent, WebhookBatch, WebhookEvent};
pub use signature::{SignatureVerifier, VerifyOutcome};
