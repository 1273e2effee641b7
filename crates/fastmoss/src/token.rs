// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Open API access token lifecycle
//!
//! The [`TokenManager`] owns the only copy of the access/refresh token pair. A token is
//! served from memory while it is more than the refresh buffer away from expiry;
//! otherwise the manager refreshes it, or requests a fresh one with the client
//! credentials when refreshing is impossible or fails.
//!
//! Reads take a shared lock only. Refreshes are serialized behind a separate async
//! mutex and re-check the cached token after acquiring it, so a burst of requests that
//! all observe an expired token triggers one upstream refresh.

use std::time::Duration;

use api_client::{FetchError, FetchResult, HttpTransport};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Credentials;

const TOKEN_PATH: &str = "/v1/token";
const REFRESH_TOKEN_PATH: &str = "/v1/refreshToken";
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

/// An access/refresh token pair
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Access token sent with every Open API call
    pub value: String,
    /// Refresh token, empty if none was issued
    pub refresh_value: String,
    /// Expiry as unix seconds
    pub expires_at: i64,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("refresh_value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// A token is usable iff `expires_at > now + buffer`
    pub fn is_usable_at(&self, now: i64, buffer: Duration) -> bool {
        let buffer = i64::try_from(buffer.as_secs()).unwrap_or(i64::MAX);
        !self.value.is_empty() && self.expires_at > now.saturating_add(buffer)
    }
}

/// Observable lifecycle state of the token cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token held
    Empty,
    /// A token usable without a network call
    Valid,
    /// A token that is expired or inside the refresh buffer
    Expired,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    code: Option<i64>,
    data: Option<TokenData>,
    msg: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    expires_in: Option<i64>,
}

/// Owner of the authenticated Open API session
#[derive(Debug)]
pub struct TokenManager {
    transport: HttpTransport,
    base_url: String,
    credentials: Option<Credentials>,
    refresh_buffer: Duration,
    token: RwLock<Option<AccessToken>>,
    refresh_guard: Mutex<()>,
}

impl TokenManager {
    /// Create a manager with an empty token cache
    pub fn new(
        transport: HttpTransport,
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        refresh_buffer: Duration,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            credentials,
            refresh_buffer,
            token: RwLock::new(None),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> TokenState {
        match self.token.read().await.as_ref() {
            None => TokenState::Empty,
            Some(token) if token.is_usable_at(Utc::now().timestamp(), self.refresh_buffer) => {
                TokenState::Valid
            }
            Some(_) => TokenState::Expired,
        }
    }

    /// Forget the cached token pair
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// Return a usable access token, refreshing or requesting one as needed
    ///
    /// Failure is reported as [`FetchError::Auth`]; the cache is then left empty and
    /// callers are expected to continue without authenticated access.
    pub async fn ensure_token(&self) -> FetchResult<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| FetchError::auth("Open API credentials are not configured"))?;

        let _singleflight = self.refresh_guard.lock().await;

        // another task may have completed a refresh while this one waited
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let refresh_value = self
            .token
            .read()
            .await
            .as_ref()
            .map(|token| token.refresh_value.clone())
            .filter(|value| !value.is_empty());

        if let Some(refresh_value) = refresh_value {
            let request = RefreshRequest {
                client_id: credentials.client_id(),
                refresh_token: &refresh_value,
            };
            match self.request_token(REFRESH_TOKEN_PATH, &request).await {
                Ok(token) => {
                    info!(expires_at = token.expires_at, "refreshed Open API access token");
                    return Ok(self.store(token).await);
                }
                Err(e) => {
                    warn!(error = %e, "Open API token refresh failed, requesting a new token");
                }
            }
        }

        let request = TokenRequest {
            client_id: credentials.client_id(),
            client_secret: credentials.client_secret(),
        };
        match self.request_token(TOKEN_PATH, &request).await {
            Ok(token) => {
                info!(expires_at = token.expires_at, "obtained Open API access token");
                Ok(self.store(token).await)
            }
            Err(e) => {
                warn!(error = %e, "Open API token request failed");
                self.invalidate().await;
                Err(FetchError::auth(format!("token acquisition failed: {e}")))
            }
        }
    }

    async fn cached_token(&self) -> Option<String> {
        let now = Utc::now().timestamp();
        self.token
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_usable_at(now, self.refresh_buffer))
            .map(|token| token.value.clone())
    }

    async fn store(&self, token: AccessToken) -> String {
        let value = token.value.clone();
        *self.token.write().await = Some(token);
        value
    }

    async fn request_token<B: Serialize>(&self, path: &str, body: &B) -> FetchResult<AccessToken> {
        let url = format!("{}{}", self.base_url, path);
        let body = serde_json::to_string(body).map_err(FetchError::malformed)?;

        debug!(url, "requesting Open API token");
        let response = self.transport.post_json(&url, &[], body).await?;
        let now = Utc::now().timestamp();
        parse_token_response(response, now)
    }
}

fn parse_token_response(response: serde_json::Value, now: i64) -> FetchResult<AccessToken> {
    let envelope: TokenEnvelope =
        serde_json::from_value(response).map_err(FetchError::malformed)?;

    match envelope.code {
        Some(0) => {}
        Some(code) => {
            let message = envelope.msg.or(envelope.message).unwrap_or_default();
            return Err(FetchError::auth(format!("code={code} message={message}")));
        }
        None => return Err(FetchError::malformed("token response has no code")),
    }

    let data = envelope
        .data
        .ok_or_else(|| FetchError::malformed("token response has no data"))?;
    if data.access_token.is_empty() {
        return Err(FetchError::malformed("token response has no access_token"));
    }

    Ok(AccessToken {
        value: data.access_token,
        refresh_value: data.refresh_token,
        expires_at: now.saturating_add(data.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS)),
    })
}
