// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget change broadcast trait.

use async_trait::async_trait;

use crate::types::ChangeNotice;

/// Receives a notice after every successful authoritative write.
///
/// Implementations must not fail the caller: delivery to UI push backends is
/// best-effort, and polling clients will observe the change through the feed
/// regardless. Tests inject a recording implementation to assert that
/// notification was attempted.
#[async_trait]
pub trait ChangeNotifier: Send + Sync + 'static {
    /// Broadcast a change. Infallible by contract; implementations log
    /// internal failures instead of surfacing them.
    async fn notify(&self, notice: ChangeNotice);
}

/// Notifier that records changes to the tracing log only.
///
/// The default wiring when no realtime push backend is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl ChangeNotifier for LogNotifier {
    async fn notify(&self, notice: ChangeNotice) {
        tracing::debug!(
            handle = notice.handle.as_str(),
            version = notice.version,
            kind = %notice.kind,
            "change broadcast"
        );
    }
}
