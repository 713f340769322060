// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tsunagi serve` command implementation.
//!
//! Wires the stores and the pipeline together and runs the gateway: SQLite
//! authoritative store, redb realtime mirror, LINE client, ingestion
//! pipeline, HTTP server.

use std::sync::Arc;

use tracing::{info, warn};

use tsunagi_config::TsunagiConfig;
use tsunagi_core::TsunagiError;
use tsunagi_core::traits::notifier::LogNotifier;
use tsunagi_core::traits::{ChangeNotifier, MirrorStore};
use tsunagi_gateway::{AppState, start_server};
use tsunagi_ingest::IngestPipeline;
use tsunagi_line::{LineClient, SignatureVerifier};
use tsunagi_mirror::RedbMirror;
use tsunagi_storage::Database;

/// Runs the `tsunagi serve` command.
pub async fn run_serve(config: TsunagiConfig) -> Result<(), TsunagiError> {
    init_tracing(&config.server.log_level);

    info!("starting tsunagi serve");

    if config.line.channel_secret.is_none() && !config.line.allow_unsigned {
        // Fail-closed verification would reject every delivery; surface the
        // misconfiguration at startup instead of serving a dead webhook.
        warn!(
            "line.channel_secret is not configured: webhook deliveries will be rejected \
             (set line.allow_unsigned for local development)"
        );
    }

    let db = Database::open(&config.storage).await?;
    info!(path = config.storage.database_path.as_str(), "authoritative store ready");

    let mirror: Arc<dyn MirrorStore> = Arc::new(RedbMirror::open(&config.mirror)?);
    info!(path = config.mirror.path.as_str(), "realtime mirror ready");

    let notifier: Arc<dyn ChangeNotifier> = Arc::new(LogNotifier);
    let line = LineClient::new(&config.line);
    let verifier = SignatureVerifier::new(&config.line);

    let pipeline = IngestPipeline::new(db, mirror, notifier, line, &config.crm);

    let state = AppState {
        pipeline: Arc::new(pipeline),
        verifier,
        feed: config.feed.clone(),
        poll: config.poll.clone(),
    };

    let server = config.server.clone();
    tokio::select! {
        result = start_server(&server, state) => result,
        _ = shutdown_signal() => {
            info!("tsunagi serve shutdown complete");
            Ok(())
        }
    }
}

/// Resolves when the process receives SIGINT (or SIGTERM on unix).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tsunagi={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
