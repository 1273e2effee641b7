// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Upstream fixtures for FastMoss integration tests
//!
//! Provides Open API and Web API mock responses plus helpers to mount them.

use std::time::Duration;

use fastmoss::{MarketAggregator, MarketDataConfig};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

pub const ACCESS_TOKEN: &str = "token-1";
pub const REFRESH_TOKEN: &str = "refresh-1";

/// Open API envelope around `data`
pub fn open_envelope(data: Value) -> Value {
    json!({"code": 0, "msg": "success", "data": data})
}

/// Web API envelope around `data`
pub fn web_envelope(data: Value) -> Value {
    json!({"code": 200, "data": data})
}

/// Successful token response
pub fn token_response(access_token: &str, refresh_token: &str, expires_in: i64) -> Value {
    open_envelope(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": expires_in
    }))
}

/// Mount a `/v1/token` endpoint issuing a long-lived token
pub async fn mount_token(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response(
                ACCESS_TOKEN,
                REFRESH_TOKEN,
                7200,
            )),
        )
        .mount(mock_server)
        .await;
}

/// Product id used for item `index` of Open API physical page `physical`
pub fn open_product_id(physical: u32, index: usize) -> String {
    format!("open-{physical}-{index}")
}

/// Product id used for item `index` of the Web API goods page
pub fn web_product_id(index: usize) -> String {
    format!("web-{index}")
}

/// Ten Open API products without images
pub fn open_product_page(physical: u32, region: &str, total: u64) -> Value {
    let list: Vec<Value> = (0..10)
        .map(|index| {
            json!({
                "product_id": open_product_id(physical, index),
                "title": format!("Open product {physical}-{index}"),
                "cover": "",
                "region": region,
                "price": "1280",
                "commission_rate": "10%",
                "day7_units_sold": "-",
                "day7_gmv": "52000.5",
                "shop": {"name": "Shop", "avatar": ""},
                "category": {"l1": {"name": "Beauty"}}
            })
        })
        .collect();

    json!({"total": total, "list": list})
}

/// Mount one Open API product page, answered after `delay`
pub async fn mount_open_product_page(
    mock_server: &MockServer,
    physical: u32,
    region: &str,
    total: u64,
    delay: Duration,
) {
    Mock::given(method("POST"))
        .and(path("/product/v1/search"))
        .and(body_partial_json(json!({"page": physical})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(open_envelope(open_product_page(physical, region, total)))
                .set_delay(delay),
        )
        .expect(1)
        .mount(mock_server)
        .await;
}

/// Ten Open API products, each with a cover image
pub fn open_product_page_with_covers(physical: u32, region: &str, total: u64) -> Value {
    let mut data = open_product_page(physical, region, total);
    if let Some(items) = data["list"].as_array_mut() {
        for (index, item) in items.iter_mut().enumerate() {
            item["cover"] = json!(format!("https://img.example/cover-{physical}-{index}.jpg"));
        }
    }
    data
}

/// Mount `data` as the only answer for Open API physical page `physical`
pub async fn mount_open_page_data(mock_server: &MockServer, physical: u32, data: Value) {
    Mock::given(method("POST"))
        .and(path("/product/v1/search"))
        .and(body_partial_json(json!({"page": physical})))
        .respond_with(ResponseTemplate::new(200).set_body_json(open_envelope(data)))
        .expect(1)
        .mount(mock_server)
        .await;
}

/// Ten Web API products, each with an image
pub fn web_product_page(region: &str, total: u64) -> Value {
    let product_list: Vec<Value> = (0..10)
        .map(|index| {
            json!({
                "product_id": web_product_id(index),
                "title": format!("Web product {index}"),
                "img": format!("https://img.example/{index}.jpg"),
                "region": region,
                "price": "980",
                "crate": "8%",
                "day7_sold_count": "120",
                "sold_count": 4000,
                "category_name_l1": ["Beauty"]
            })
        })
        .collect();

    json!({"total_cnt": total, "product_list": product_list})
}

/// Ten Web API products whose items carry no `region` key
pub fn web_product_page_without_region(total: u64) -> Value {
    let mut data = web_product_page("", total);
    if let Some(items) = data["product_list"].as_array_mut() {
        for item in items.iter_mut().filter_map(Value::as_object_mut) {
            item.remove("region");
        }
    }
    data
}

/// Configuration pointing at the two mock servers
pub fn test_config(open_api: &MockServer, web_api: &MockServer) -> MarketDataConfig {
    MarketDataConfig::for_testing(&open_api.uri(), &web_api.uri())
}

/// Aggregator over the two mock servers
pub fn test_aggregator(open_api: &MockServer, web_api: &MockServer) -> MarketAggregator {
    MarketAggregator::new(&test_config(open_api, web_api)).unwrap()
}
