// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Snapshot parameters, read from `SNAPSHOT_*` environment variables

use config::{Config, ConfigError, Environment};
use market_types::SortBy;
use serde::Deserialize;

/// Which downstream operation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `search_products`
    Products,
    /// `get_product_videos`
    Videos,
    /// `get_top_ecommerce_creators`
    Creators,
}

/// Parameters of one snapshot run
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRequest {
    pub operation: Operation,
    pub region: String,
    pub page: u32,
    pub page_size: u32,
    pub keywords: String,
    pub sort_by: String,
    pub product_id: String,
    /// Video window in days
    pub days: u32,
    /// Creator ranking period (`day`, `week`, `month`)
    pub date_type: String,
    pub date_value: String,
}

impl SnapshotRequest {
    /// Load parameters from the environment over built-in defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix("SNAPSHOT").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("operation", "products")?
            .set_default("region", "JP")?
            .set_default("page", 1)?
            .set_default("page_size", 50)?
            .set_default("keywords", "")?
            .set_default("sort_by", SortBy::default().as_str())?
            .set_default("product_id", "")?
            .set_default("days", 7)?
            .set_default("date_type", "week")?
            .set_default("date_value", "")?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Requested sort order; unknown values fall back to the default order
    pub fn sort_by(&self) -> SortBy {
        SortBy::from_param(&self.sort_by)
    }
}
