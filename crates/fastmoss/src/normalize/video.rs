// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Video normalizer for the Open API video list

use api_client::FetchResult;
use market_types::{CanonicalVideo, Number, VideoPage};
use serde::Deserialize;
use serde_json::Value;

use super::{decode_items, loose_string, safe_f64, safe_i64, safe_number, total_count};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoMeta {
    #[serde(deserialize_with = "loose_string")]
    cover: String,
    #[serde(deserialize_with = "loose_string")]
    video_desc: String,
    duration: Option<Value>,
    #[serde(deserialize_with = "loose_string")]
    tiktok_url: String,
    #[serde(deserialize_with = "loose_string")]
    fastmoss_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVideo {
    #[serde(deserialize_with = "loose_string")]
    video_id: String,
    #[serde(deserialize_with = "loose_string")]
    product_id: String,
    #[serde(deserialize_with = "loose_string")]
    uid: String,
    video: Option<VideoMeta>,
    play_count: Option<Value>,
    digg_count: Option<Value>,
    comment_count: Option<Value>,
    share_count: Option<Value>,
    sold_count: Option<Value>,
    sale_amount: Option<Value>,
    #[serde(deserialize_with = "loose_string")]
    create_date: String,
    #[serde(deserialize_with = "loose_string")]
    region: String,
    is_ad: Option<Value>,
}

impl From<RawVideo> for CanonicalVideo {
    fn from(raw: RawVideo) -> Self {
        let meta = raw.video.unwrap_or_default();
        let is_ad = match raw.is_ad {
            Some(Value::Bool(flag)) => flag,
            other => safe_number(other.as_ref(), Number::ZERO).is_truthy(),
        };

        Self {
            video_id: raw.video_id,
            product_id: raw.product_id,
            creator_uid: raw.uid,
            cover: meta.cover,
            description: meta.video_desc,
            duration: safe_i64(meta.duration.as_ref()),
            tiktok_url: meta.tiktok_url,
            fastmoss_url: meta.fastmoss_url,
            play_count: safe_i64(raw.play_count.as_ref()),
            like_count: safe_i64(raw.digg_count.as_ref()),
            comment_count: safe_i64(raw.comment_count.as_ref()),
            share_count: safe_i64(raw.share_count.as_ref()),
            sold_count: safe_i64(raw.sold_count.as_ref()),
            sale_amount: safe_f64(raw.sale_amount.as_ref()),
            create_date: raw.create_date,
            region: raw.region,
            is_ad,
        }
    }
}

/// Normalize an Open API product video page
///
/// `total` arrives either as `{total: n}` or as a bare count.
pub fn normalize_video_list(data: &Value) -> FetchResult<VideoPage> {
    let videos = decode_items::<RawVideo>(data, "list", "open_api.product_videos")?
        .into_iter()
        .map(CanonicalVideo::from)
        .collect();

    Ok(VideoPage {
        total: total_count(data.get("total")),
        videos,
    })
}
