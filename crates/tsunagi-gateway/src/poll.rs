// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-poll endpoint over the change feed.
//!
//! The handler deliberately holds the request open, re-checking the feed at
//! a fixed interval until data appears or the (capped) client timeout
//! elapses. The loop is bounded by its deadline regardless of whether the
//! client is still listening, so an abandoned poll cannot leak the task.
//! Transient feed-check failures count as "no change this iteration"; a
//! store that fails its health probe before the loop starts is a 503.

use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tsunagi_storage::feed;
use tsunagi_storage::models::Message;

use crate::api::ErrorResponse;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PollParams {
    /// Requested hold time in seconds, capped by `poll.max_timeout_secs`.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Highest feed version the client has seen; 0 for a fresh client.
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub changes: Vec<Message>,
    /// Version for the client's next poll: the last delivered change, or
    /// the current version on an empty timeout (no drift either way).
    pub version: i64,
    pub timeout: bool,
}

/// GET /api/poll?timeout=&version=&handle=
pub async fn get_poll(
    State(state): State<AppState>,
    Query(params): Query<PollParams>,
) -> Response {
    let db = state.pipeline.database();
    let timeout_secs = params
        .timeout
        .unwrap_or(state.poll.max_timeout_secs)
        .clamp(1, state.poll.max_timeout_secs);
    let client_version = params.version.unwrap_or(0).max(0);
    let check_interval = Duration::from_millis(state.poll.check_interval_ms);

    // Health gate: the backing store must answer before we start holding
    // the connection. One lazy re-probe, then 503.
    if db.probe().await.is_err() && db.probe().await.is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "change feed store is not available".to_string(),
            }),
        )
            .into_response();
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        match feed::needs_update(db, client_version).await {
            Ok(true) => {
                match feed::changes_since(
                    db,
                    client_version,
                    params.handle.as_deref(),
                    state.feed.max_batch,
                )
                .await
                {
                    Ok(changes) if !changes.is_empty() => {
                        let version = changes.last().map(|m| m.version).unwrap_or(client_version);
                        return Json(PollResponse {
                            changes,
                            version,
                            timeout: false,
                        })
                        .into_response();
                    }
                    // A change landed for some other handle; keep waiting.
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "poll fetch failed, treating as no change");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "poll check failed, treating as no change");
            }
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(check_interval.min(deadline - now)).await;
    }

    // Empty timeout: report the current version so the client re-issues
    // with an unchanged position.
    let version = feed::current_version(db).await.unwrap_or(client_version);
    Json(PollResponse {
        changes: Vec::new(),
        version,
        timeout: true,
    })
    .into_response()
}
