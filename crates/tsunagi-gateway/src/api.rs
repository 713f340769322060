// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff-facing read API and the outbound reply endpoint.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use tsunagi_core::types::MirrorEntry;
use tsunagi_storage::feed;
use tsunagi_storage::models::{ConversationSummary, Message};
use tsunagi_storage::queries::messages;

use crate::server::AppState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(err: impl std::fmt::Display) -> Response {
    error!(error = %err, "api request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// --- GET /health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: bool,
    pub mirror: bool,
}

/// GET /health
///
/// Unauthenticated liveness probe over both stores.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = state.pipeline.database().probe().await.is_ok();
    let mirror = state.pipeline.mirror().probe().await.is_ok();
    Json(HealthResponse {
        status: if storage { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage,
        mirror,
    })
}

// --- GET /api/conversation ---

#[derive(Debug, Deserialize)]
pub struct ConversationParams {
    pub handle: String,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub handle: String,
    pub messages: Vec<Message>,
    /// Current feed version, so the client can start polling from here.
    pub version: i64,
}

/// GET /api/conversation?handle=&limit=&offset=
pub async fn get_conversation(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
) -> Response {
    let db = state.pipeline.database();
    let limit = params.limit.unwrap_or(50).clamp(1, state.feed.max_batch);
    let offset = params.offset.unwrap_or(0).max(0);

    let messages = match messages::get_conversation(db, &params.handle, limit, offset).await {
        Ok(messages) => messages,
        Err(e) => return internal_error(e),
    };
    let version = match feed::current_version(db).await {
        Ok(version) => version,
        Err(e) => return internal_error(e),
    };

    Json(ConversationResponse {
        handle: params.handle,
        messages,
        version,
    })
    .into_response()
}

// --- GET /api/incremental ---

#[derive(Debug, Deserialize)]
pub struct IncrementalParams {
    #[serde(default)]
    pub version: Option<i64>,
    /// `messages` (default) or `conversations`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IncrementalChanges {
    Messages(Vec<Message>),
    Conversations(Vec<ConversationSummary>),
}

#[derive(Debug, Serialize)]
pub struct IncrementalResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: i64,
    pub changes: IncrementalChanges,
    /// md5 of the canonical JSON (sorted keys) of `changes`, for
    /// client-side integrity verification.
    pub checksum: String,
}

/// GET /api/incremental?version=&type=conversations|messages&handle=
pub async fn get_incremental(
    State(state): State<AppState>,
    Query(params): Query<IncrementalParams>,
) -> Response {
    let db = state.pipeline.database();
    let client_version = params.version.unwrap_or(0);
    let kind = params.kind.as_deref().unwrap_or("messages");

    let changes = match kind {
        "messages" => {
            match feed::changes_since(
                db,
                client_version,
                params.handle.as_deref(),
                state.feed.max_batch,
            )
            .await
            {
                Ok(messages) => IncrementalChanges::Messages(messages),
                Err(e) => return internal_error(e),
            }
        }
        "conversations" => {
            match feed::summaries_since(db, client_version, params.handle.as_deref()).await {
                Ok(summaries) => IncrementalChanges::Conversations(summaries),
                Err(e) => return internal_error(e),
            }
        }
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("unknown incremental type `{other}`"),
                }),
            )
                .into_response();
        }
    };

    let version = match feed::current_version(db).await {
        Ok(version) => version,
        Err(e) => return internal_error(e),
    };
    let checksum = match content_checksum(&changes) {
        Ok(checksum) => checksum,
        Err(e) => return internal_error(e),
    };

    Json(IncrementalResponse {
        kind: kind.to_string(),
        version,
        changes,
        checksum,
    })
    .into_response()
}

/// md5 over the canonical JSON rendering of the change payload.
///
/// serde_json maps are BTree-backed, so object keys come out sorted once
/// the payload passes through `Value`; the hex digest is stable across
/// struct field order.
fn content_checksum<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(payload)?;
    let canonical = serde_json::to_string(&value)?;
    Ok(format!("{:x}", md5::compute(canonical.as_bytes())))
}

// --- POST /api/messages ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub handle: String,
    pub text: String,
    #[serde(default)]
    pub staff_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub id: i64,
    pub version: i64,
    pub delivered: bool,
    /// `sent` or `failed` (terminal; manual retry only).
    pub status: String,
}

/// POST /api/messages
pub async fn post_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    let pipeline = &state.pipeline;
    let result = tsunagi_ingest::outbound::send_reply(
        pipeline.database(),
        pipeline.mirror(),
        pipeline.notifier(),
        pipeline.line(),
        &body.handle,
        &body.text,
        body.staff_id.as_deref(),
    )
    .await;

    match result {
        Ok(outbound) => Json(SendMessageResponse {
            id: outbound.id,
            version: outbound.version,
            delivered: outbound.delivered,
            status: if outbound.delivered { "sent" } else { "failed" }.to_string(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

// --- PUT /api/messages/{id}/status ---

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub id: i64,
    pub version: i64,
    /// The status actually stored, which may be the schema-safe fallback
    /// when the requested value was rejected.
    pub status: String,
}

/// PUT /api/messages/{id}/status
///
/// Transitions a message's delivery/read status, advancing its feed
/// version. A status value the schema's domain rejects is stored as the
/// fallback rather than dropped.
pub async fn put_message_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Response {
    let db = state.pipeline.database();
    let version = match messages::update_status(db, id, &body.status).await {
        Ok(Some(version)) => version,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("no message with id {id}"),
                }),
            )
                .into_response();
        }
        Err(e) => return internal_error(e),
    };

    // Report the stored value, not the requested one.
    let status = match messages::get_message(db, id).await {
        Ok(Some(message)) => message.status,
        Ok(None) => body.status,
        Err(e) => return internal_error(e),
    };

    Json(UpdateStatusResponse {
        id,
        version,
        status,
    })
    .into_response()
}

// --- GET /api/mirror ---

#[derive(Debug, Deserialize)]
pub struct MirrorParams {
    pub handle: String,
}

#[derive(Debug, Serialize)]
pub struct MirrorResponse {
    pub handle: String,
    pub entries: Vec<MirrorEntry>,
}

/// GET /api/mirror?handle=
///
/// Low-latency read boundary for the live chat UI. Serves the abbreviated
/// projections only; the authoritative rows come from `/api/conversation`.
pub async fn get_mirror(
    State(state): State<AppState>,
    Query(params): Query<MirrorParams>,
) -> Response {
    match state.pipeline.mirror().recent(&params.handle).await {
        Ok(entries) => Json(MirrorResponse {
            handle: params.handle,
            entries,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}
