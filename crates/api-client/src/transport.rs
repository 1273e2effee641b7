// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Timeout-bounded HTTP transport
//!
//! One [`HttpTransport`] owns one `reqwest` connection pool, built on first use and
//! shared by every clone. Calls return the parsed JSON body of a `200 OK` response;
//! anything else becomes a [`FetchError`].

use std::{sync::Arc, time::Duration};

use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;
use tokio::{sync::OnceCell, time::timeout};
use tracing::{debug, trace};

use crate::{FetchError, FetchResult};

const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Transport settings applied to every request
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-call timeout
    pub timeout: Duration,
    /// Default user agent, overridable per request
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            user_agent: concat!("tiktok-market-data/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Shared, lazily initialised HTTP transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    config: TransportConfig,
    client: Arc<OnceCell<Client>>,
}

impl HttpTransport {
    /// Create a transport; no connection pool is built until the first call
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            client: Arc::new(OnceCell::new()),
        }
    }

    /// Whether the connection pool has been built
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> FetchResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                debug!(
                    timeout_ms = self.config.timeout.as_millis(),
                    "building shared HTTP client"
                );
                Client::builder()
                    .timeout(self.config.timeout)
                    .user_agent(self.config.user_agent.as_str())
                    .build()
                    .map_err(|e| FetchError::network(format!("failed to build HTTP client: {e}")))
            })
            .await
    }

    /// POST a pre-serialized JSON body
    ///
    /// The body is sent byte-for-byte, so a signature computed over the same string
    /// stays valid.
    pub async fn post_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: String,
    ) -> FetchResult<Value> {
        let request = self
            .client()
            .await?
            .post(url)
            .query(query)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);

        self.execute(url, request).await
    }

    /// GET with query parameters and extra headers
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> FetchResult<Value> {
        let request = self.client().await?.get(url).query(query).headers(headers);

        self.execute(url, request).await
    }

    async fn execute(&self, url: &str, request: RequestBuilder) -> FetchResult<Value> {
        trace!(url, "sending upstream request");

        let response = timeout(self.config.timeout, request.send())
            .await
            .map_err(|_| {
                FetchError::network(format!(
                    "request timed out after {}ms",
                    self.config.timeout.as_millis()
                ))
            })?
            .map_err(FetchError::network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::rejected(
                i64::from(status.as_u16()),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let text = response.text().await.map_err(FetchError::network)?;
        serde_json::from_str(&text).map_err(FetchError::malformed)
    }
}
