// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Creator ranking normalizers
//!
//! Neither upstream reports a usable rank, so ranks are computed from the requested
//! page, the page size and each item's position in the raw list.

use api_client::FetchResult;
use market_types::{CanonicalCreator, CreatorPage};
use serde::Deserialize;
use serde_json::Value;

use super::{
    category_names, decode_indexed_items, loose_string, safe_f64, safe_i64, total_count,
};

/// `(page - 1) * page_size + index + 1`, with page clamped to at least 1
pub fn creator_rank(page: u32, page_size: u32, index: usize) -> u64 {
    let offset = u64::from(page.max(1) - 1) * u64::from(page_size);
    offset + index as u64 + 1
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenApiCreator {
    #[serde(deserialize_with = "loose_string")]
    uid: String,
    #[serde(deserialize_with = "loose_string")]
    unique_id: String,
    #[serde(deserialize_with = "loose_string")]
    nickname: String,
    #[serde(deserialize_with = "loose_string")]
    avatar: String,
    #[serde(deserialize_with = "loose_string")]
    region: String,
    category: Option<Value>,
    follower_count: Option<Value>,
    product_count: Option<Value>,
    total_gmv: Option<Value>,
    #[serde(deserialize_with = "loose_string")]
    currency: String,
}

/// Normalize an Open API top e-commerce creator page (`{list, total}`)
pub fn normalize_open_api_creators(
    data: &Value,
    page: u32,
    page_size: u32,
) -> FetchResult<CreatorPage> {
    let creators = decode_indexed_items::<OpenApiCreator>(data, "list", "open_api.top_creators")?
        .into_iter()
        .map(|(index, raw)| CanonicalCreator {
            rank: creator_rank(page, page_size, index),
            uid: raw.uid,
            unique_id: raw.unique_id,
            nickname: raw.nickname,
            avatar: raw.avatar,
            region: raw.region,
            category: category_names(raw.category.as_ref()),
            follower_count: safe_i64(raw.follower_count.as_ref()),
            product_count: safe_i64(raw.product_count.as_ref()),
            total_gmv: safe_f64(raw.total_gmv.as_ref()),
            currency: raw.currency,
        })
        .collect();

    Ok(CreatorPage {
        total: total_count(data.get("total")),
        creators,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebApiCreator {
    #[serde(deserialize_with = "loose_string")]
    uid: String,
    #[serde(deserialize_with = "loose_string")]
    unique_id: String,
    #[serde(deserialize_with = "loose_string")]
    nickname: String,
    #[serde(deserialize_with = "loose_string")]
    avatar: String,
    #[serde(deserialize_with = "loose_string")]
    region: String,
    category: Option<Value>,
    follower_count: Option<Value>,
    sale_28d_count: Option<Value>,
    sale_28d_amount: Option<Value>,
}

/// Normalize a Web API author search page (`{author_list, total_cnt | total}`)
///
/// The Web API reports 28-day sales, which stand in for product count and GMV. No
/// currency is reported.
pub fn normalize_web_api_creators(
    data: &Value,
    page: u32,
    page_size: u32,
) -> FetchResult<CreatorPage> {
    let creators =
        decode_indexed_items::<WebApiCreator>(data, "author_list", "web_api.author_search")?
            .into_iter()
            .map(|(index, raw)| CanonicalCreator {
                rank: creator_rank(page, page_size, index),
                uid: raw.uid,
                unique_id: raw.unique_id,
                nickname: raw.nickname,
                avatar: raw.avatar,
                region: raw.region,
                category: category_names(raw.category.as_ref()),
                follower_count: safe_i64(raw.follower_count.as_ref()),
                product_count: safe_i64(raw.sale_28d_count.as_ref()),
                total_gmv: safe_f64(raw.sale_28d_amount.as_ref()),
                currency: String::new(),
            })
            .collect();

    Ok(CreatorPage {
        total: total_count(data.get("total_cnt").or_else(|| data.get("total"))),
        creators,
    })
}
