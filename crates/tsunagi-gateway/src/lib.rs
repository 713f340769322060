// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Tsunagi CRM backend.
//!
//! Routes:
//! - `POST /webhook/line`: signature-verified event ingestion; 200 always
//!   once the signature passes, 401 only for verification failure.
//! - `GET /api/conversation`: ordered messages for one handle.
//! - `GET /api/poll`: long-poll over the change feed.
//! - `GET /api/incremental`: typed incremental diff with content checksum.
//! - `POST /api/messages`: staff outbound reply.
//! - `PUT /api/messages/{id}/status`: status transition with fallback.
//! - `GET /api/mirror`: abbreviated projections for the live UI.
//! - `GET /health`: unauthenticated liveness probe.

pub mod api;
pub mod poll;
pub mod server;
pub mod webhook;

pub use server::{AppState, build_router, start_server};
