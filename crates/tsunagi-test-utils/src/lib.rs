// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tsunagi integration tests.
//!
//! Provides in-memory doubles for the pipeline seams so tests run fast,
//! deterministic, and CI-runnable without a redb file or a realtime
//! backend:
//!
//! - [`MockMirror`] - In-memory mirror with an injectable failure switch
//! - [`MockNotifier`] - Change notifier that records every notice

pub mod mock_mirror;
pub mod mock_notifier;

pub use mock_mirror::MockMirror;
pub use mock_notifier::MockNotifier;
