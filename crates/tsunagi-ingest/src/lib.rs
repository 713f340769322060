// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event ingestion pipeline: dispatch, identity enrichment, dual-store
//! write coordination, and the outbound reply path.
//!
//! The pipeline consumes decoded webhook events, resolves each sender to a
//! customer, and persists conversation messages mirror-first with the
//! relational store as the sole correctness boundary. Per-event failures
//! are isolated; a batch never fails wholesale because one event did.

pub mod dispatcher;
pub mod outbound;
pub mod referral;
pub mod writer;

pub use dispatcher::{BatchResult, EventResult, IngestPipeline};
pub use outbound::OutboundResult;
pub use writer::StoredMessage;
