//! fredcat - harvest FRED series metadata by category
//!
//! Walks FRED category ids in order, serving each from the local store when
//! it has been seen before and fetching it otherwise, then writes every
//! series found to a CSV file.

use std::process;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fredcat::cache::{self, CategoryCache};
use fredcat::cli::{Cli, RunConfig};
use fredcat::data::FredClient;
use fredcat::harvest::Harvester;
use fredcat::throttle::FixedDelay;

/// Sets up the global tracing subscriber, honouring `RUST_LOG`
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fredcat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment, including RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment variables from .env file"),
        Err(_) => debug!("no .env file found, using system environment variables"),
    }

    let cli = Cli::parse();
    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let store = cache::open_store(config.backend, config.store_path.clone())?;
    let client = FredClient::new(config.api_key.as_str()).with_base_url(config.base_url.as_str());
    let category_cache =
        CategoryCache::new(store.as_ref(), FixedDelay::new(config.delay)).with_policy(config.policy);

    info!(
        categories = config.harvest.categories,
        stored = store.len()?,
        "starting harvest"
    );

    let mut harvester = Harvester::new(category_cache, &client, config.harvest.clone());
    tokio::select! {
        result = harvester.run() => result?,
        _ = tokio::signal::ctrl_c() => warn!("interrupted, writing partial results"),
    }
    let summary = harvester.finish()?;

    info!(
        categories = summary.categories,
        cached = summary.cached,
        fetched = summary.fetched,
        failed = summary.failed,
        rows = summary.rows,
        "harvest complete"
    );

    store.close()?;
    Ok(())
}
