// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Orchestration of both upstreams behind three downstream operations
//!
//! The [`MarketAggregator`] decides which client to call, fans physical page fetches
//! out as concurrent tasks, walks the fallback chain when a source fails, and caches
//! what it returns. No public operation returns an error: when every source is
//! exhausted the result is a well-formed empty page.
//!
//! # Pagination
//!
//! The Open API serves at most [`OPEN_API_PAGE_SIZE`] items per physical page. A
//! logical page of [`LOGICAL_PAGE_SIZE`] items is assembled from five consecutive
//! physical pages, fetched concurrently and merged in ascending physical page order
//! regardless of completion order. Logical page 1 takes its first ten items from the
//! Web API because only the Web API returns product images.

use std::{collections::HashMap, sync::Arc};

use api_client::{FetchError, FetchResult, HttpTransport, TransportConfig};
use config::ConfigError;
use market_types::{CanonicalProduct, CreatorPage, ProductPage, SortBy, VideoPage};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheKey, CacheStats, CachedPage, ResponseCache},
    config::MarketDataConfig,
    open_api::{OPEN_API_PAGE_SIZE, OpenApiClient},
    web_api::WebApiClient,
};

/// Physical pages assembled into one logical product page
pub const PHYSICAL_PAGES_PER_LOGICAL_PAGE: u32 = 5;

/// Items in one logical product page
pub const LOGICAL_PAGE_SIZE: u32 = OPEN_API_PAGE_SIZE * PHYSICAL_PAGES_PER_LOGICAL_PAGE;

/// Longest video window in days
pub const MAX_VIDEO_DATE_TYPE: u32 = 28;

const DEFAULT_CREATOR_PERIOD: &str = "week";

/// First physical page backing a logical page
pub fn first_physical_page(logical_page: u32) -> u32 {
    (logical_page.max(1) - 1)
        .saturating_mul(PHYSICAL_PAGES_PER_LOGICAL_PAGE)
        .saturating_add(1)
}

/// The aggregation layer over the Open API and Web API
#[derive(Debug)]
pub struct MarketAggregator {
    open_api: Arc<OpenApiClient>,
    web_api: Arc<WebApiClient>,
    cache: ResponseCache,
    image_backfill: bool,
}

impl MarketAggregator {
    /// Build both clients over one shared transport
    pub fn new(config: &MarketDataConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(TransportConfig {
            timeout: config.timeout_seconds.value(),
            ..TransportConfig::default()
        });
        let open_api = OpenApiClient::new(config, transport.clone());
        let web_api = WebApiClient::new(config, transport)?;

        info!(
            open_api_configured = open_api.is_configured(),
            image_backfill = config.image_backfill,
            cache_ttl_seconds = config.cache.ttl_seconds,
            "market aggregator initialized"
        );

        Ok(Self::with_clients(open_api, web_api, config))
    }

    /// Assemble an aggregator from existing clients
    pub fn with_clients(
        open_api: OpenApiClient,
        web_api: WebApiClient,
        config: &MarketDataConfig,
    ) -> Self {
        Self {
            open_api: Arc::new(open_api),
            web_api: Arc::new(web_api),
            cache: ResponseCache::with_settings(config.cache.ttl(), config.cache.soft_limit),
            image_backfill: config.image_backfill,
        }
    }

    /// The response cache
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Snapshot of the response cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The Open API client
    pub fn open_api(&self) -> &OpenApiClient {
        &self.open_api
    }

    /// One logical page of the product ranking
    ///
    /// `page_size` only distinguishes cache entries and sizes the image backfill
    /// lookup; a logical page always spans five physical pages.
    pub async fn search_products(
        &self,
        region: &str,
        page: u32,
        page_size: u32,
        keywords: &str,
        sort_by: SortBy,
    ) -> ProductPage {
        let page = page.max(1);
        let key = CacheKey::Products {
            region: region.to_string(),
            page,
            page_size,
            sort_by,
            keywords: keywords.to_string(),
        };
        if let Some(CachedPage::Products(cached)) = self.cache.get(&key) {
            debug!(cache_key = %key, "serving products from cache");
            return cached;
        }

        let mut result = if page == 1 {
            self.first_logical_page(region, keywords, sort_by).await
        } else {
            let first = first_physical_page(page);
            let handles = (0..PHYSICAL_PAGES_PER_LOGICAL_PAGE)
                .map(|offset| first.saturating_add(offset))
                .map(|physical| self.spawn_open_page(region, physical, keywords, sort_by))
                .collect();
            merge_product_pages(join_in_order(handles).await)
        };

        if result.is_empty() {
            warn!(region, page, "no product source returned data");
            return ProductPage::empty();
        }

        if self.image_backfill {
            self.backfill_images(&mut result, region, page, page_size, keywords, sort_by)
                .await;
        }

        debug!(
            cache_key = %key,
            total = result.total,
            products = result.products.len(),
            "caching product page"
        );
        self.cache.set(key, CachedPage::Products(result.clone()));
        result
    }

    /// Web API page 1 for the image-bearing head, Open API pages 2 to 5 for the rest
    async fn first_logical_page(
        &self,
        region: &str,
        keywords: &str,
        sort_by: SortBy,
    ) -> ProductPage {
        let web_api = Arc::clone(&self.web_api);
        let (web_region, web_keywords) = (region.to_string(), keywords.to_string());
        let web_task = tokio::spawn(async move {
            web_api
                .search_products(&web_region, 1, OPEN_API_PAGE_SIZE, &web_keywords, sort_by)
                .await
        });

        let open_tasks = (2..=PHYSICAL_PAGES_PER_LOGICAL_PAGE)
            .map(|physical| self.spawn_open_page(region, physical, keywords, sort_by))
            .collect();

        let head = match join_task(web_task).await {
            Ok(goods) if goods.serves_region(region) => Ok(goods.page),
            Ok(_) => {
                warn!(
                    region,
                    "Web API page 1 is empty or for another region, using Open API page 1"
                );
                self.open_api
                    .product_search(region, 1, keywords, sort_by)
                    .await
            }
            Err(e) => {
                warn!(region, error = %e, "Web API page 1 unavailable, using Open API page 1");
                self.open_api
                    .product_search(region, 1, keywords, sort_by)
                    .await
            }
        };

        let mut pages = vec![head];
        pages.extend(join_in_order(open_tasks).await);
        merge_product_pages(pages)
    }

    fn spawn_open_page(
        &self,
        region: &str,
        physical_page: u32,
        keywords: &str,
        sort_by: SortBy,
    ) -> JoinHandle<FetchResult<ProductPage>> {
        let open_api = Arc::clone(&self.open_api);
        let region = region.to_string();
        let keywords = keywords.to_string();
        tokio::spawn(async move {
            open_api
                .product_search(&region, physical_page, &keywords, sort_by)
                .await
        })
    }

    /// Fill missing images from one Web API search with the same filters
    async fn backfill_images(
        &self,
        result: &mut ProductPage,
        region: &str,
        page: u32,
        page_size: u32,
        keywords: &str,
        sort_by: SortBy,
    ) {
        if result.products.iter().all(CanonicalProduct::has_image) {
            return;
        }

        let Ok(source) = self
            .web_api
            .search_products(region, page, page_size, keywords, sort_by)
            .await
            .map(|goods| goods.page)
        else {
            return;
        };

        let images: HashMap<&str, &str> = source
            .products
            .iter()
            .filter(|product| !product.product_id.is_empty() && product.has_image())
            .map(|product| (product.product_id.as_str(), product.image.as_str()))
            .collect();

        let mut filled = 0_usize;
        for product in result.products.iter_mut().filter(|p| !p.has_image()) {
            if let Some(image) = images.get(product.product_id.as_str()) {
                product.image = (*image).to_string();
                filled += 1;
            }
        }
        debug!(region, page, filled, "backfilled product images");
    }

    /// Videos promoting a product; Open API only
    pub async fn get_product_videos(
        &self,
        product_id: &str,
        date_type: u32,
        page: u32,
        page_size: u32,
    ) -> VideoPage {
        let date_type = date_type.clamp(1, MAX_VIDEO_DATE_TYPE);
        let page = page.max(1);
        let page_size = page_size.clamp(1, OPEN_API_PAGE_SIZE);
        let key = CacheKey::Videos {
            product_id: product_id.to_string(),
            date_type,
            page,
            page_size,
        };
        if let Some(CachedPage::Videos(cached)) = self.cache.get(&key) {
            debug!(cache_key = %key, "serving videos from cache");
            return cached;
        }

        match self
            .open_api
            .product_videos(product_id, date_type, page, page_size)
            .await
        {
            Ok(videos) => {
                self.cache.set(key, CachedPage::Videos(videos.clone()));
                videos
            }
            Err(_) => VideoPage::empty(),
        }
    }

    /// Creator ranking by GMV, falling back to the Web API sales ranking
    ///
    /// An empty `date_type` means `"week"`; an empty `date_value` lets upstream pick
    /// the latest period.
    pub async fn get_top_ecommerce_creators(
        &self,
        region: &str,
        page: u32,
        page_size: u32,
        date_type: &str,
        date_value: &str,
    ) -> CreatorPage {
        let page = page.max(1);
        let page_size = page_size.clamp(1, OPEN_API_PAGE_SIZE);
        let date_type = match date_type.trim() {
            "" => DEFAULT_CREATOR_PERIOD,
            period => period,
        };
        let key = CacheKey::Creators {
            region: region.to_string(),
            page,
            page_size,
            date_type: date_type.to_string(),
            date_value: date_value.to_string(),
        };
        if let Some(CachedPage::Creators(cached)) = self.cache.get(&key) {
            debug!(cache_key = %key, "serving creators from cache");
            return cached;
        }

        let creators = match self
            .open_api
            .top_ecommerce_creators(region, page, page_size, date_type, date_value)
            .await
        {
            Ok(creators) => Ok(creators),
            Err(e) => {
                warn!(region, page, kind = %e.kind(), "falling back to Web API creator search");
                self.web_api.search_creators(region, page, page_size).await
            }
        };

        match creators {
            Ok(creators) => {
                self.cache.set(key, CachedPage::Creators(creators.clone()));
                creators
            }
            Err(_) => {
                warn!(region, page, "no creator source returned data");
                CreatorPage::empty()
            }
        }
    }
}

async fn join_task<T>(handle: JoinHandle<FetchResult<T>>) -> FetchResult<T> {
    handle.await.unwrap_or_else(|e| {
        warn!(error = %e, "page fetch task did not complete");
        Err(FetchError::network(format!("page fetch task did not complete: {e}")))
    })
}

/// Await every handle in the order given, whatever order they finish in
async fn join_in_order<T>(handles: Vec<JoinHandle<FetchResult<T>>>) -> Vec<FetchResult<T>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(join_task(handle).await);
    }
    results
}

/// Concatenate successful pages in order; the total is the largest reported
fn merge_product_pages(pages: Vec<FetchResult<ProductPage>>) -> ProductPage {
    pages
        .into_iter()
        .filter_map(Result::ok)
        .fold(ProductPage::empty(), |mut merged, page| {
            merged.total = merged.total.max(page.total);
            merged.products.extend(page.products);
            merged
        })
}
