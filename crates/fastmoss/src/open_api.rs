// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Authenticated, signed access to the FastMoss Open API
//!
//! Every call is a POST carrying `client_id`, `access_token`, `timestamp`, `sign` and
//! `signature_version=2` as query parameters. The JSON body is serialized once, signed,
//! and sent byte-for-byte so the signature covers exactly what goes over the wire.
//!
//! Responses use the envelope `{code, data, msg | message}`; only `code == 0` with a
//! `data` payload is a success. Physical pages are capped at [`OPEN_API_PAGE_SIZE`].

use std::collections::BTreeMap;

use api_client::{FetchError, FetchResult, HttpTransport};
use chrono::Utc;
use market_types::{CreatorPage, ProductPage, SortBy, VideoPage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::{Credentials, MarketDataConfig},
    normalize::{
        normalize_open_api_creators, normalize_open_api_products, normalize_video_list, value_text,
    },
    signer::RequestSigner,
    token::TokenManager,
};

/// Maximum items per physical Open API page
pub const OPEN_API_PAGE_SIZE: u32 = 10;

const PRODUCT_SEARCH_URI: &str = "/product/v1/search";
const PRODUCT_VIDEOS_URI: &str = "/product/v1/videoList";
const TOP_ECOMMERCE_CREATORS_URI: &str = "/creator/v1/rank/topEcommerce";
const SIGNATURE_VERSION: &str = "2";

#[derive(Debug, Serialize)]
struct RegionFilter<'a> {
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct ProductSearchBody<'a> {
    filter: RegionFilter<'a>,
    page: u32,
    pagesize: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<&'a str>,
    orderby: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
struct VideoFilter<'a> {
    product_id: &'a str,
    date_type: String,
}

#[derive(Debug, Serialize)]
struct ProductVideosBody<'a> {
    filter: VideoFilter<'a>,
    page: u32,
    pagesize: u32,
}

#[derive(Debug, Serialize)]
struct DateInfo<'a> {
    #[serde(rename = "type")]
    period: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreatorFilter<'a> {
    region: &'a str,
    date_info: DateInfo<'a>,
}

#[derive(Debug, Serialize)]
struct OrderField {
    field: &'static str,
    order: &'static str,
}

#[derive(Debug, Serialize)]
struct TopCreatorsBody<'a> {
    filter: CreatorFilter<'a>,
    orderby: [OrderField; 1],
    page: u32,
    pagesize: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<Value>,
    data: Option<Value>,
    msg: Option<Value>,
    message: Option<Value>,
}

impl Envelope {
    fn into_data(self) -> FetchResult<Value> {
        let code = self
            .code
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(|| FetchError::malformed("envelope has no integer code"))?;

        if code != 0 {
            let message = self
                .msg
                .or(self.message)
                .as_ref()
                .map(value_text)
                .unwrap_or_default();
            return Err(FetchError::rejected(code, message));
        }

        match self.data {
            Some(Value::Null) | None => Err(FetchError::malformed("envelope has no data")),
            Some(data) => Ok(data),
        }
    }
}

/// Client for the authenticated Open API
#[derive(Debug)]
pub struct OpenApiClient {
    transport: HttpTransport,
    base_url: String,
    credentials: Option<Credentials>,
    tokens: TokenManager,
}

impl OpenApiClient {
    /// Build a client sharing `transport`; no network activity happens here
    pub fn new(config: &MarketDataConfig, transport: HttpTransport) -> Self {
        let base_url = config.open_api.base_url.trim_end_matches('/').to_string();
        let credentials = config.open_api.credentials();
        let tokens = TokenManager::new(
            transport.clone(),
            base_url.clone(),
            credentials.clone(),
            config.token_refresh_buffer(),
        );

        Self {
            transport,
            base_url,
            credentials,
            tokens,
        }
    }

    /// Whether credentials are configured
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send a signed request and unwrap the response envelope
    ///
    /// Every failure is logged at warning level before it is returned.
    pub async fn request<B>(&self, uri: &str, body: &B) -> FetchResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let result = self.send(uri, body).await;
        if let Err(e) = &result {
            warn!(uri, kind = %e.kind(), error = %e, "Open API request failed");
        }
        result
    }

    async fn send<B>(&self, uri: &str, body: &B) -> FetchResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| FetchError::auth("Open API credentials are not configured"))?;

        let access_token = self.tokens.ensure_token().await?;

        let canonical = RequestSigner::canonical_body(body).map_err(FetchError::malformed)?;
        let sign = RequestSigner::new(credentials.client_secret()).sign_canonical(uri, &canonical);

        let query = [
            ("client_id", credentials.client_id().to_string()),
            ("access_token", access_token),
            ("timestamp", Utc::now().timestamp().to_string()),
            ("sign", sign),
            ("signature_version", SIGNATURE_VERSION.to_string()),
        ];

        let url = format!("{}{}", self.base_url, uri);
        debug!(uri, "sending Open API request");
        let response = self.transport.post_json(&url, &query, canonical).await?;

        let envelope: Envelope =
            serde_json::from_value(response).map_err(FetchError::malformed)?;
        envelope.into_data()
    }

    /// Fetch one physical page of the product ranking
    pub async fn product_search(
        &self,
        region: &str,
        page: u32,
        keywords: &str,
        sort_by: SortBy,
    ) -> FetchResult<ProductPage> {
        let body = ProductSearchBody {
            filter: RegionFilter { region },
            page,
            pagesize: OPEN_API_PAGE_SIZE,
            keywords: (!keywords.is_empty()).then_some(keywords),
            orderby: BTreeMap::from([(sort_by.as_str(), "desc")]),
        };

        let data = self.request(PRODUCT_SEARCH_URI, &body).await?;
        normalize_open_api_products(&data).inspect_err(|e| {
            warn!(uri = PRODUCT_SEARCH_URI, page, error = %e, "unusable product page");
        })
    }

    /// Fetch videos promoting a product over the last `date_type` days
    pub async fn product_videos(
        &self,
        product_id: &str,
        date_type: u32,
        page: u32,
        page_size: u32,
    ) -> FetchResult<VideoPage> {
        let body = ProductVideosBody {
            filter: VideoFilter {
                product_id,
                date_type: date_type.to_string(),
            },
            page,
            pagesize: page_size.min(OPEN_API_PAGE_SIZE),
        };

        let data = self.request(PRODUCT_VIDEOS_URI, &body).await?;
        normalize_video_list(&data).inspect_err(|e| {
            warn!(uri = PRODUCT_VIDEOS_URI, product_id, error = %e, "unusable video page");
        })
    }

    /// Fetch one page of the top e-commerce creator ranking, ordered by GMV
    pub async fn top_ecommerce_creators(
        &self,
        region: &str,
        page: u32,
        page_size: u32,
        date_type: &str,
        date_value: &str,
    ) -> FetchResult<CreatorPage> {
        let page_size = page_size.min(OPEN_API_PAGE_SIZE);
        let body = TopCreatorsBody {
            filter: CreatorFilter {
                region,
                date_info: DateInfo {
                    period: date_type,
                    value: (!date_value.is_empty()).then_some(date_value),
                },
            },
            orderby: [OrderField {
                field: "total_gmv",
                order: "desc",
            }],
            page,
            pagesize: page_size,
        };

        let data = self.request(TOP_ECOMMERCE_CREATORS_URI, &body).await?;
        normalize_open_api_creators(&data, page, page_size).inspect_err(|e| {
            warn!(uri = TOP_ECOMMERCE_CREATORS_URI, page, error = %e, "unusable creator page");
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn product_body_field_order() {
        let body = ProductSearchBody {
            filter: RegionFilter { region: "JP" },
            page: 3,
            pagesize: OPEN_API_PAGE_SIZE,
            keywords: Some("lip"),
            orderby: BTreeMap::from([(SortBy::Day7Gmv.as_str(), "desc")]),
        };

        assert_eq!(
            RequestSigner::canonical_body(&body).unwrap(),
            r#"{"filter":{"region":"JP"},"page":3,"pagesize":10,"keywords":"lip","orderby":{"day7_gmv":"desc"}}"#
        );
    }

    #[test]
    fn product_body_omits_empty_keywords() {
        let body = ProductSearchBody {
            filter: RegionFilter { region: "US" },
            page: 1,
            pagesize: OPEN_API_PAGE_SIZE,
            keywords: None,
            orderby: BTreeMap::from([(SortBy::default().as_str(), "desc")]),
        };

        assert_eq!(
            RequestSigner::canonical_body(&body).unwrap(),
            r#"{"filter":{"region":"US"},"page":1,"pagesize":10,"orderby":{"day7_units_sold":"desc"}}"#
        );
    }

    #[test]
    fn video_body_sends_date_type_as_text() {
        let body = ProductVideosBody {
            filter: VideoFilter {
                product_id: "1729",
                date_type: 28.to_string(),
            },
            page: 1,
            pagesize: 10,
        };

        assert_eq!(
            RequestSigner::canonical_body(&body).unwrap(),
            r#"{"filter":{"product_id":"1729","date_type":"28"},"page":1,"pagesize":10}"#
        );
    }

    #[test]
    fn creator_body_carries_date_info_and_gmv_order() {
        let body = TopCreatorsBody {
            filter: CreatorFilter {
                region: "JP",
                date_info: DateInfo {
                    period: "week",
                    value: None,
                },
            },
            orderby: [OrderField {
                field: "total_gmv",
                order: "desc",
            }],
            page: 2,
            pagesize: 10,
        };

        assert_eq!(
            RequestSigner::canonical_body(&body).unwrap(),
            r#"{"filter":{"region":"JP","date_info":{"type":"week"}},"orderby":[{"field":"total_gmv","order":"desc"}],"page":2,"pagesize":10}"#
        );
    }

    #[test]
    fn envelope_success_yields_data() {
        let data = envelope(json!({"code": 0, "data": {"list": []}}))
            .into_data()
            .unwrap();
        assert_eq!(data, json!({"list": []}));
    }

    #[test]
    fn envelope_rejection_carries_code_and_message() {
        let error = envelope(json!({"code": 40001, "message": "sign error"}))
            .into_data()
            .unwrap_err();
        assert_eq!(error, FetchError::rejected(40001, "sign error"));

        let error = envelope(json!({"code": 500, "msg": "busy", "message": "ignored"}))
            .into_data()
            .unwrap_err();
        assert_eq!(error, FetchError::rejected(500, "busy"));
    }

    #[test]
    fn envelope_without_code_or_data_is_malformed() {
        let error = envelope(json!({"data": {}})).into_data().unwrap_err();
        assert_eq!(error.kind(), api_client::FailureKind::MalformedResponse);

        let error = envelope(json!({"code": 0, "data": null}))
            .into_data()
            .unwrap_err();
        assert_eq!(error.kind(), api_client::FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn unconfigured_client_fails_with_auth() {
        let config = MarketDataConfig {
            open_api: crate::config::OpenApiSettings {
                base_url: "http://127.0.0.1:9".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let transport = HttpTransport::default();
        let client = OpenApiClient::new(&config, transport.clone());

        let error = client
            .product_search("JP", 1, "", SortBy::default())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), api_client::FailureKind::Auth);
        assert!(!client.is_configured());
        assert!(!transport.is_initialized());
    }
}
