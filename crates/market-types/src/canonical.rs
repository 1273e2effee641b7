// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical product, video and creator shapes returned to downstream callers

use serde::{Deserialize, Serialize};

/// A ranked TikTok Shop product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Upstream product identifier
    pub product_id: String,
    /// Product title
    pub title: String,
    /// Cover image URL, empty when no source provided one
    pub image: String,
    /// Market region code (JP, US, ...)
    pub region: String,
    /// Coerced unit price
    pub price: f64,
    /// Price text as displayed upstream
    pub price_display: String,
    /// Affiliate commission rate
    pub commission_rate: f64,
    /// Units sold over the last 7 days
    pub day7_units_sold: i64,
    /// GMV over the last 7 days
    pub day7_gmv: f64,
    /// Lifetime units sold
    pub total_units_sold: i64,
    /// Lifetime GMV
    pub total_gmv: f64,
    /// Creators promoting the product
    pub creator_count: i64,
    /// Videos featuring the product
    pub video_count: i64,
    /// Product rating
    pub product_rating: f64,
    /// Shop name
    pub shop_name: String,
    /// Shop avatar URL
    pub shop_avatar: String,
    /// Top-level category name
    pub category_name: String,
    /// Provider detail page
    pub fastmoss_url: String,
    /// TikTok Shop product page
    pub tiktok_url: String,
}

impl CanonicalProduct {
    /// Whether an image URL is present
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}

/// A TikTok video attributed to a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVideo {
    /// Video identifier
    pub video_id: String,
    /// Parent product identifier
    pub product_id: String,
    /// Creator identifier
    pub creator_uid: String,
    /// Cover image URL
    pub cover: String,
    /// Video description
    pub description: String,
    /// Duration in seconds
    pub duration: i64,
    /// TikTok video URL
    pub tiktok_url: String,
    /// Provider detail page
    pub fastmoss_url: String,
    /// Play count
    pub play_count: i64,
    /// Like count
    pub like_count: i64,
    /// Comment count
    pub comment_count: i64,
    /// Share count
    pub share_count: i64,
    /// Units sold attributed to the video
    pub sold_count: i64,
    /// Sales amount attributed to the video
    pub sale_amount: f64,
    /// Creation date as reported upstream
    pub create_date: String,
    /// Market region code
    pub region: String,
    /// Whether the video ran as an ad
    pub is_ad: bool,
}

/// A creator in the e-commerce sales ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCreator {
    /// 1-based rank across pages
    pub rank: u64,
    /// Internal creator identifier
    pub uid: String,
    /// Public TikTok handle
    pub unique_id: String,
    /// Display name
    pub nickname: String,
    /// Avatar URL
    pub avatar: String,
    /// Market region code
    pub region: String,
    /// Category names
    pub category: Vec<String>,
    /// Follower count
    pub follower_count: i64,
    /// Products promoted
    pub product_count: i64,
    /// Total GMV
    pub total_gmv: f64,
    /// Currency of `total_gmv`, empty when unknown
    pub currency: String,
}

/// One logical page of products
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Best estimate of the total number of matching products
    pub total: u64,
    /// Products in rank order
    pub products: Vec<CanonicalProduct>,
}

/// One page of product videos
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoPage {
    /// Total number of videos reported upstream
    pub total: u64,
    /// Videos in upstream order
    pub videos: Vec<CanonicalVideo>,
}

/// One page of the creator ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorPage {
    /// Total number of ranked creators reported upstream
    pub total: u64,
    /// Creators in rank order
    pub creators: Vec<CanonicalCreator>,
}

impl ProductPage {
    /// The well-formed empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the page carries no products
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl VideoPage {
    /// The well-formed empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the page carries no videos
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

impl CreatorPage {
    /// The well-formed empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the page carries no creators
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}
