// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Unauthenticated access to the FastMoss Web API
//!
//! The Web API backs the provider's own site. Requests look like a browser's: every
//! call carries a millisecond `_time`, a random six digit `cnonce`, and browser
//! headers. It is the only source of product images and serves as a best-effort
//! fallback for creator rankings.

use api_client::{FetchError, FetchResult, HttpTransport};
use chrono::Utc;
use config::ConfigError;
use market_types::{CreatorPage, SortBy};
use rand::Rng;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::MarketDataConfig,
    normalize::{GoodsPage, normalize_web_api_creators, normalize_web_api_goods, value_text},
};

const GOODS_SEARCH_PATH: &str = "/goods/V2/search";
const AUTHOR_SEARCH_PATH: &str = "/author/search";
const SUCCESS_CODE: i64 = 200;
// sales descending
const AUTHOR_SALES_ORDER: &str = "2,2";

#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<Value>,
    data: Option<Value>,
    msg: Option<Value>,
}

impl Envelope {
    fn into_data(self) -> FetchResult<Value> {
        let code = self.code.as_ref().and_then(Value::as_i64);

        match (code, self.data) {
            (_, Some(data @ Value::Object(_))) => Ok(data),
            (Some(SUCCESS_CODE), Some(data)) if !data.is_null() => Ok(data),
            (Some(SUCCESS_CODE), _) => Err(FetchError::malformed("envelope has no data")),
            (code, _) => Err(FetchError::rejected(
                code.unwrap_or_default(),
                self.msg.as_ref().map(value_text).unwrap_or_default(),
            )),
        }
    }
}

/// Client for the browser-facing Web API
#[derive(Debug, Clone)]
pub struct WebApiClient {
    transport: HttpTransport,
    base_url: String,
    headers: HeaderMap,
}

impl WebApiClient {
    /// Build a client sharing `transport`
    ///
    /// Fails if the configured user agent or referer is not a valid header value.
    pub fn new(config: &MarketDataConfig, transport: HttpTransport) -> Result<Self, ConfigError> {
        let header = |name: &str, value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| ConfigError::Message(format!("invalid web_api.{name}: {e}")))
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header("user_agent", &config.web_api.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(REFERER, header("referer", &config.web_api.referer)?);

        Ok(Self {
            transport,
            base_url: config.web_api.base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Send a GET with anti-automation parameters and unwrap the envelope
    ///
    /// Every failure is logged at warning level before it is returned.
    pub async fn request(&self, path: &str, params: &[(&str, String)]) -> FetchResult<Value> {
        let result = self.send(path, params).await;
        if let Err(e) = &result {
            warn!(path, kind = %e.kind(), error = %e, "Web API request failed");
        }
        result
    }

    async fn send(&self, path: &str, params: &[(&str, String)]) -> FetchResult<Value> {
        let mut query = params.to_vec();
        query.push(("_time", Utc::now().timestamp_millis().to_string()));
        query.push(("cnonce", rand::rng().random_range(100_000..=999_999).to_string()));

        let url = format!("{}{}", self.base_url, path);
        debug!(path, "sending Web API request");
        let response = self
            .transport
            .get_json(&url, &query, self.headers.clone())
            .await?;

        let envelope: Envelope =
            serde_json::from_value(response).map_err(FetchError::malformed)?;
        envelope.into_data()
    }

    /// Search the goods ranking; used for page 1 and for image backfill
    pub async fn search_products(
        &self,
        region: &str,
        page: u32,
        page_size: u32,
        keywords: &str,
        sort_by: SortBy,
    ) -> FetchResult<GoodsPage> {
        let mut params = vec![
            ("region", region.to_string()),
            ("page", page.to_string()),
            ("pagesize", page_size.to_string()),
            ("order", sort_by.web_order_code().to_string()),
        ];
        if !keywords.is_empty() {
            params.push(("keyword", keywords.to_string()));
        }

        let data = self.request(GOODS_SEARCH_PATH, &params).await?;
        normalize_web_api_goods(&data).inspect_err(|e| {
            warn!(path = GOODS_SEARCH_PATH, page, error = %e, "unusable goods page");
        })
    }

    /// Search creators ordered by sales, the fallback for the creator ranking
    pub async fn search_creators(
        &self,
        region: &str,
        page: u32,
        page_size: u32,
    ) -> FetchResult<CreatorPage> {
        let params = [
            ("region", region.to_string()),
            ("page", page.to_string()),
            ("pagesize", page_size.to_string()),
            ("order", AUTHOR_SALES_ORDER.to_string()),
        ];

        let data = self.request(AUTHOR_SEARCH_PATH, &params).await?;
        normalize_web_api_creators(&data, page, page_size).inspect_err(|e| {
            warn!(path = AUTHOR_SEARCH_PATH, page, error = %e, "unusable author page");
        })
    }
}
