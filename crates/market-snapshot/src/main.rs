// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Market Snapshot
//!
//! Runs one aggregator operation against the configured FastMoss endpoints and
//! prints the canonical result as JSON.

use anyhow::Result;
use fastmoss::{MarketAggregator, MarketDataConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod request;

use request::{Operation, SnapshotRequest};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = MarketDataConfig::from_env()?;
    let request = SnapshotRequest::from_env()?;
    let aggregator = MarketAggregator::new(&config)?;

    info!(
        operation = ?request.operation,
        region = %request.region,
        page = request.page,
        open_api = aggregator.open_api().is_configured(),
        "Running market snapshot"
    );

    let output = match request.operation {
        Operation::Products => serde_json::to_string_pretty(
            &aggregator
                .search_products(
                    &request.region,
                    request.page,
                    request.page_size,
                    &request.keywords,
                    request.sort_by(),
                )
                .await,
        )?,
        Operation::Videos => serde_json::to_string_pretty(
            &aggregator
                .get_product_videos(
                    &request.product_id,
                    request.days,
                    request.page,
                    request.page_size,
                )
                .await,
        )?,
        Operation::Creators => serde_json::to_string_pretty(
            &aggregator
                .get_top_ecommerce_creators(
                    &request.region,
                    request.page,
                    request.page_size,
                    &request.date_type,
                    &request.date_value,
                )
                .await,
        )?,
    };

    println!("{output}");

    let stats = aggregator.cache_stats();
    info!(?stats, "Snapshot complete");
    Ok(())
}
