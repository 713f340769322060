// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits for the pluggable edges of the ingestion pipeline.

pub mod mirror;
pub mod notifier;

pub use mirror::MirrorStore;
pub use notifier::ChangeNotifier;
