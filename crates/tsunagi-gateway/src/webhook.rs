// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook endpoint.
//!
//! Signature verification is the only condition that produces a non-200:
//! once a delivery is authenticated, the response is HTTP 200 no matter
//! what happened to individual events, because a non-200 would trigger the
//! platform's retry storm against a batch we have already partially
//! processed. Logical failures travel in the response body and the logs.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use tsunagi_ingest::EventResult;
use tsunagi_line::WebhookBatch;

use crate::server::AppState;

pub(crate) const SIGNATURE_HEADER: &str = "x-line-signature";

/// Response body for POST /webhook/line.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// `ok` when the batch was dispatched, `error` when the body was
    /// undecodable. Per-event outcomes are in `events_results`.
    pub status: String,
    pub execution_id: String,
    pub events_processed: usize,
    pub events_results: Vec<EventResult>,
}

/// Error response body (signature failures only).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /webhook/line
pub async fn post_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.verifier.verify(&body, signature);
    if !outcome.is_valid() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: format!("signature verification failed: {outcome:?}"),
            }),
        )
            .into_response();
    }

    let batch: WebhookBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            // Authenticated but undecodable: still 200 to suppress retries.
            warn!(error = %e, "webhook body was not a decodable batch");
            return (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "error".to_string(),
                    execution_id: uuid::Uuid::new_v4().to_string(),
                    events_processed: 0,
                    events_results: Vec::new(),
                }),
            )
                .into_response();
        }
    };

    let result = state.pipeline.process_batch(batch).await;
    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "ok".to_string(),
            execution_id: result.execution_id,
            events_processed: result.events_processed,
            events_results: result.events_results,
        }),
    )
        .into_response()
}
