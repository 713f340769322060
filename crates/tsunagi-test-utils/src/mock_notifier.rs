// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change notifier double that records every notice for assertion.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tsunagi_core::traits::ChangeNotifier;
use tsunagi_core::types::ChangeNotice;

/// Records notification attempts without a realtime backend.
#[derive(Default)]
pub struct MockNotifier {
    notices: Arc<Mutex<Vec<ChangeNotice>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices received so far, in order.
    pub async fn notices(&self) -> Vec<ChangeNotice> {
        self.notices.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.notices.lock().await.len()
    }
}

#[async_trait]
impl ChangeNotifier for MockNotifier {
    async fn notify(&self, notice: ChangeNotice) {
        self.notices.lock().await.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsunagi_core::types::MessageKind;

    #[tokio::test]
    async fn notices_are_recorded_in_order() {
        let notifier = MockNotifier::new();
        notifier
            .notify(ChangeNotice {
                handle: "U1".to_string(),
                version: 1,
                kind: MessageKind::Text,
            })
            .await;
        notifier
            .notify(ChangeNotice {
                handle: "U1".to_string(),
                version: 2,
                kind: MessageKind::System,
            })
            .await;

        assert_eq!(notifier.count().await, 2);
        let notices = notifier.notices().await;
        assert_eq!(notices[0].version, 1);
        assert_eq!(notices[1].version, 2);
    }
}
