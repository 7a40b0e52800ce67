use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod db;
mod error;
mod feeds;
mod projection;
mod service;

use api::AppState;
use config::Config;
use db::CrosswalkDb;
use feeds::{BlobStore, FeedCache, HttpBlobStore, LocalBlobStore};
use service::ProjectionService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Feed store: remote bucket or local directory
    let store: Arc<dyn BlobStore> = match (&config.feed_base_url, &config.feed_dir) {
        (Some(url), _) => {
            info!("Reading feeds from {} (max {} attempts)", url, config.feed_max_attempts);
            Arc::new(HttpBlobStore::new(url, config.feed_max_attempts)?)
        }
        (None, Some(dir)) => {
            info!("Reading feeds from local directory {}", dir);
            Arc::new(LocalBlobStore::new(dir))
        }
        (None, None) => anyhow::bail!("no feed source configured"),
    };

    // Open crosswalk database
    let crosswalk = CrosswalkDb::open(&config.crosswalk_db_path)?;
    if let Some(seed) = &config.crosswalk_seed {
        crosswalk.import_json(seed)?;
    }
    info!(
        "Crosswalk opened: {} ({} mappings)",
        config.crosswalk_db_path,
        crosswalk.count()?
    );

    let cache = FeedCache::new(Duration::from_secs(config.feed_cache_ttl_secs));
    let state = AppState {
        service: ProjectionService::new(store, cache, crosswalk),
        default_sport: config.sport()?,
        default_service: config.service()?,
    };
    let app = api::router(state);

    let addr = config.listen_socket()?;
    info!("Projections API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
