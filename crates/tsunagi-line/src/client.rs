// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound LINE API client: profile fetch and push delivery.
//!
//! The bearer token comes from persisted configuration only, so a token
//! rotation takes effect on config reload without a redeploy. Delivery
//! failures are surfaced to the caller; retry policy is the caller's
//! concern (the ingestion pipeline records a terminal `failed` status and
//! leaves retry to staff).

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use tsunagi_config::model::LineConfig;
use tsunagi_core::TsunagiError;

/// A LINE user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "statusMessage", default)]
    pub status_message: Option<String>,
}

/// Authenticated client for the LINE messaging API.
#[derive(Clone)]
pub struct LineClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl std::fmt::Debug for LineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineClient")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.channel_token.clone(),
        }
    }

    fn token(&self) -> Result<&str, TsunagiError> {
        self.token.as_deref().ok_or_else(|| TsunagiError::Platform {
            message: "line.channel_token not configured".to_string(),
            source: None,
        })
    }

    /// Fetch a user's profile.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Profile, TsunagiError> {
        let token = self.token()?;
        let url = format!("{}/v2/bot/profile/{user_id}", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| TsunagiError::Platform {
                message: format!("profile fetch failed for {user_id}"),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            return Err(TsunagiError::Platform {
                message: format!(
                    "profile fetch for {user_id} returned {}",
                    response.status()
                ),
                source: None,
            });
        }

        let profile: Profile = response.json().await.map_err(|e| TsunagiError::Platform {
            message: format!("profile response for {user_id} was not valid JSON"),
            source: Some(Box::new(e)),
        })?;
        debug!(user_id, display_name = profile.display_name.as_str(), "profile fetched");
        Ok(profile)
    }

    /// Push a text message to a user.
    pub async fn push_text(&self, to: &str, text: &str) -> Result<(), TsunagiError> {
        let token = self.token()?;
        let url = format!("{}/v2/bot/message/push", self.api_base);
        let body = serde_json::json!({
            "to": to,
            "messages": [{"type": "text", "text": text}],
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TsunagiError::Platform {
                message: format!("push to {to} failed"),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            return Err(TsunagiError::Platform {
                message: format!("push to {to} returned {}", response.status()),
                source: None,
            });
        }
        debug!(to, "push delivered");
        Ok(())
    }
}
