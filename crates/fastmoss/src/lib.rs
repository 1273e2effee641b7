// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Aggregation and resilience layer over the FastMoss TikTok Shop analytics APIs
//!
//! FastMoss exposes two incompatible upstreams: an authenticated, signed Open API
//! capped at ten items per page, and an unauthenticated Web API that is the only
//! source of product images. This crate turns both into one dependable source of
//! canonical products, videos and creators.
//!
//! # Architecture
//!
//! - **Cache Store**: [`cache::ResponseCache`] - TTL-keyed results with lazy expiry
//! - **Request Signer**: [`signer::RequestSigner`] - SHA-256 signatures over canonical bodies
//! - **Token Manager**: [`token::TokenManager`] - access/refresh token lifecycle with singleflight refresh
//! - **Clients**: [`open_api::OpenApiClient`] and [`web_api::WebApiClient`]
//! - **Normalizers**: [`normalize`] - one mapping per (upstream, entity) pair
//! - **Aggregator**: [`aggregator::MarketAggregator`] - pagination virtualization, fan-out and fallback
//!
//! # Usage
//!
//! ```no_run
//! use fastmoss::{MarketAggregator, MarketDataConfig};
//! use market_types::SortBy;
//!
//! # async fn run() -> Result<(), config::ConfigError> {
//! let config = MarketDataConfig::from_env()?;
//! let aggregator = MarketAggregator::new(&config)?;
//!
//! let page = aggregator
//!     .search_products("JP", 1, 50, "", SortBy::Day7Gmv)
//!     .await;
//! println!("{} of {} products", page.products.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod normalize;
pub mod open_api;
pub mod signer;
pub mod token;
pub mod web_api;

pub use aggregator::{LOGICAL_PAGE_SIZE, MarketAggregator};
pub use cache::{CacheKey, CacheStats, CachedPage, ResponseCache, TtlCache};
pub use config::{Credentials, MarketDataConfig};
pub use open_api::{OPEN_API_PAGE_SIZE, OpenApiClient};
pub use signer::RequestSigner;
pub use token::{AccessToken, TokenManager, TokenState};
pub use web_api::WebApiClient;
