// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort text classification: referral codes and phone hints.
//!
//! Both matchers are heuristics. A referral match only annotates the
//! customer's source metadata and never suppresses message persistence;
//! phone extraction feeds cross-channel identity hints and a false negative
//! just means no unification on this contact.

use std::sync::OnceLock;

use regex::Regex;

/// Classification of an inbound text as referral input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralTag {
    /// The customer sent the explicit skip keyword.
    Skip,
    /// A plausible referral code (3-10 alphanumerics).
    Code(String),
}

fn referral_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{3,10}$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"09\d{8}").unwrap())
}

/// Classify a message text as referral input, if it looks like one.
pub fn classify_referral(text: &str) -> Option<ReferralTag> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("skip") {
        return Some(ReferralTag::Skip);
    }
    if referral_re().is_match(trimmed) {
        return Some(ReferralTag::Code(trimmed.to_string()));
    }
    None
}

/// Extract mobile phone numbers from free-text profile fields.
pub fn extract_phones(text: &str) -> Vec<String> {
    let mut phones = Vec::new();
    for m in phone_re().find_iter(text) {
        let phone = m.as_str().to_string();
        if !phones.contains(&phone) {
            phones.push(phone);
        }
    }
    phones
}
