// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;

use tsunagi_config::model::{FeedConfig, PollConfig, ServerConfig};
use tsunagi_core::TsunagiError;
use tsunagi_ingest::IngestPipeline;
use tsunagi_line::SignatureVerifier;

use crate::{api, poll, webhook};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ingestion pipeline (owns the database, mirror, notifier, client).
    pub pipeline: Arc<IngestPipeline>,
    /// Webhook signature verifier.
    pub verifier: SignatureVerifier,
    /// Change feed settings.
    pub feed: FeedConfig,
    /// Long-poll settings.
    pub poll: PollConfig,
}

/// Build the gateway router over the shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::get_health))
        .route("/webhook/line", post(webhook::post_webhook))
        .route("/api/conversation", get(api::get_conversation))
        .route("/api/poll", get(poll::get_poll))
        .route("/api/incremental", get(api::get_incremental))
        .route("/api/messages", post(api::post_message))
        .route("/api/messages/{id}/status", put(api::put_message_status))
        .route("/api/mirror", get(api::get_mirror))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), TsunagiError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TsunagiError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| TsunagiError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
