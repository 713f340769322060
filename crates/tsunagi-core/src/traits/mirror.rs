// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime mirror trait for the low-latency UI read store.

use async_trait::async_trait;

use crate::error::TsunagiError;
use crate::types::MirrorEntry;

/// Secondary, latency-optimized store feeding the live chat UI.
///
/// Keyed by platform handle; each handle maps to a bounded list of
/// abbreviated message projections. The mirror is written before the
/// authoritative store to minimize perceived latency, then superseded once
/// the authoritative id is known. It is eventually consistent with the
/// relational store and may be rebuilt from it at any time.
#[async_trait]
pub trait MirrorStore: Send + Sync + 'static {
    /// Append a projection to the handle's list, evicting the oldest entries
    /// beyond the store's retention bound.
    async fn append(&self, handle: &str, entry: MirrorEntry) -> Result<(), TsunagiError>;

    /// Replace the entry previously appended under `temp_id` with one keyed
    /// by the authoritative id. Appends if the temporary entry is gone.
    async fn supersede(
        &self,
        handle: &str,
        temp_id: &str,
        entry: MirrorEntry,
    ) -> Result<(), TsunagiError>;

    /// The handle's current projections, oldest first.
    async fn recent(&self, handle: &str) -> Result<Vec<MirrorEntry>, TsunagiError>;

    /// Cheap liveness probe used by the health endpoint.
    async fn probe(&self) -> Result<(), TsunagiError>;
}
