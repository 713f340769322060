// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the authoritative store.

pub mod activities;
pub mod customers;
pub mod identifiers;
pub mod leads;
pub mod messages;
