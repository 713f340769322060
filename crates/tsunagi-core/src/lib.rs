// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tsunagi CRM backend.
//!
//! This crate provides the error type, domain types, and the seam traits
//! (realtime mirror, change notifier) shared across the Tsunagi workspace.
//! The authoritative store, the mirror, and the ingestion pipeline all
//! speak the types defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TsunagiError;
pub use types::{
    ChangeNotice, CustomerState, IdentifierKind, MessageKind, MessageStatus, MirrorEntry,
};

pub use traits::{ChangeNotifier, MirrorStore};
