// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature verification.
//!
//! LINE signs each webhook delivery with `base64(HMAC-SHA256(body, channel
//! secret))` in the `x-line-signature` header. Verification fails closed
//! when the secret is unconfigured; the explicit `allow_unsigned` flag (and
//! only that flag) short-circuits missing-config and missing-header cases
//! for local development. A configured secret with a mismatching signature
//! is never bypassed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, error, warn};

use tsunagi_config::model::LineConfig;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Signature matched the body.
    Verified,
    /// No channel secret configured; rejected (fail-closed).
    MissingConfig,
    /// No signature header on the request; rejected.
    MissingSignature,
    /// Signature present but did not match the body.
    Mismatch,
    /// Accepted without verification under the explicit development flag.
    DevBypass,
}

impl VerifyOutcome {
    /// Whether the delivery may proceed to event processing.
    pub fn is_valid(self) -> bool {
        matches!(self, VerifyOutcome::Verified | VerifyOutcome::DevBypass)
    }
}

/// Verifier configured from the LINE section of the config file.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<String>,
    allow_unsigned: bool,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .field("allow_unsigned", &self.allow_unsigned)
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            secret: config.channel_secret.clone(),
            allow_unsigned: config.allow_unsigned,
        }
    }

    /// Verify a delivery. Emits one audit log entry per call so operators
    /// can tell missing configuration apart from a genuine mismatch.
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> VerifyOutcome {
        let secret = match &self.secret {
            Some(secret) => secret,
            None => {
                if self.allow_unsigned {
                    warn!("webhook accepted without signature: allow_unsigned is set");
                    return VerifyOutcome::DevBypass;
                }
                error!("webhook rejected: no channel secret configured");
                return VerifyOutcome::MissingConfig;
            }
        };

        let header = match header {
            Some(header) if !header.is_empty() => header,
            _ => {
                if self.allow_unsigned {
                    warn!("webhook accepted without signature header: allow_unsigned is set");
                    return VerifyOutcome::DevBypass;
                }
                warn!("webhook rejected: signature header missing");
                return VerifyOutcome::MissingSignature;
            }
        };

        let provided = match BASE64.decode(header) {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!("webhook rejected: signature header is not valid base64");
                return VerifyOutcome::Mismatch;
            }
        };

        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(e) => {
                error!(error = %e, "HMAC initialization failed");
                return VerifyOutcome::Mismatch;
            }
        };
        mac.update(body);

        // verify_slice is the constant-time comparison.
        match mac.verify_slice(&provided) {
            Ok(()) => {
                debug!("webhook signature verified");
                VerifyOutcome::Verified
            }
            Err(_) => {
                warn!("webhook rejected: signature mismatch");
                VerifyOutcome::Mismatch
            }
        }
    }
}

/// Compute the signature LINE would send for a body. Used by tests and
/// local tooling.
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(secret: Option<&str>, allow_unsigned: bool) -> SignatureVerifier {
        SignatureVerifier::new(&LineConfig {
            channel_secret: secret.map(|s| s.to_string()),
            channel_token: None,
            api_base: "https://api.line.me".to_string(),
            allow_unsigned,
        })
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"events":[]}"#;
        let header = sign(body, "secret");
        let outcome = verifier(Some("secret"), false).verify(body, Some(&header));
        assert_eq!(outcome, VerifyOutcome::Verified);
        assert!(outcome.is_valid());
    }

    #[test]
    fn tampered_body_is_a_mismatch() {
        let header = sign(br#"{"events":[]}"#, "secret");
        let outcome = verifier(Some("secret"), false).verify(b"{\"events\":[1]}", Some(&header));
        assert_eq!(outcome, VerifyOutcome::Mismatch);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn wrong_secret_is_a_mismatch() {
        let body = br#"{"events":[]}"#;
        let header = sign(body, "other-secret");
        let outcome = verifier(Some("secret"), false).verify(body, Some(&header));
        assert_eq!(outcome, VerifyOutcome::Mismatch);
    }

    #[test]
    fn missing_header_fails() {
        let outcome = verifier(Some("secret"), false).verify(b"{}", None);
        assert_eq!(outcome, VerifyOutcome::MissingSignature);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn missing_secret_fails_closed() {
        let body = b"{}";
        let header = sign(body, "whatever");
        let outcome = verifier(None, false).verify(body, Some(&header));
        assert_eq!(outcome, VerifyOutcome::MissingConfig);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn dev_flag_bypasses_missing_secret_and_header() {
        assert_eq!(
            verifier(None, true).verify(b"{}", None),
            VerifyOutcome::DevBypass
        );
        assert_eq!(
            verifier(Some("secret"), true).verify(b"{}", None),
            VerifyOutcome::DevBypass
        );
    }

    #[test]
    fn dev_flag_does_not_bypass_an_actual_mismatch() {
        let body = b"{}";
        let header = sign(body, "other-secret");
        let outcome = verifier(Some("secret"), true).verify(body, Some(&header));
        assert_eq!(outcome, VerifyOutcome::Mismatch);
    }

    #[test]
    fn garbage_base64_header_is_a_mismatch() {
        let outcome = verifier(Some("secret"), false).verify(b"{}", Some("!!not-base64!!"));
        assert_eq!(outcome, VerifyOutcome::Mismatch);
    }

    #[test]
    fn debug_redacts_the_secret() {
        let v = verifier(Some("super-secret"), false);
        let debug = format!("{v:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
