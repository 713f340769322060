// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mirror store for deterministic testing.
//!
//! `MockMirror` implements `MirrorStore` over a plain HashMap and can be
//! switched into a failing mode to exercise the mirror-failure isolation
//! path of the dual-store writer.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tsunagi_core::TsunagiError;
use tsunagi_core::traits::MirrorStore;
use tsunagi_core::types::MirrorEntry;

/// An in-memory mirror for testing.
#[derive(Default)]
pub struct MockMirror {
    entries: Arc<Mutex<HashMap<String, Vec<MirrorEntry>>>>,
    failing: AtomicBool,
}

impl MockMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mirror operation fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), TsunagiError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TsunagiError::Mirror {
                message: "mock mirror failure injected".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for MockMirror {
    async fn append(&self, handle: &str, entry: MirrorEntry) -> Result<(), TsunagiError> {
        self.check()?;
        self.entries
            .lock()
            .await
            .entry(handle.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn supersede(
        &self,
        handle: &str,
        temp_id: &str,
        entry: MirrorEntry,
    ) -> Result<(), TsunagiError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        let list = entries.entry(handle.to_string()).or_default();
        match list.iter_mut().find(|e| e.id == temp_id) {
            Some(slot) => *slot = entry,
            None => list.push(entry),
        }
        Ok(())
    }

    async fn recent(&self, handle: &str) -> Result<Vec<MirrorEntry>, TsunagiError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .await
            .get(handle)
            .cloned()
            .unwrap_or_default())
    }

    async fn probe(&self) -> Result<(), TsunagiError> {
        self.check()
    }
}
