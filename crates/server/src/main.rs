//! edgesearch server entry point.
//!
//! Boots the HTTP gateway: loads configuration, opens both cache tiers,
//! builds the provider registry and serves the search routes.
//! Logs are JSON on stdout, filtered by `RUST_LOG`.

use std::sync::Arc;

use anyhow::{Context, Result};
use edgesearch_client::{DispatchConfig, HttpDispatcher};
use edgesearch_core::{AppConfig, CacheCoordinator, DurableStore, EphemeralTier, ProviderRegistry, SearchPipeline};
use tracing_subscriber::EnvFilter;

mod envelope;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).json().init();

    let config = AppConfig::load().context("loading configuration")?;
    let pipeline = build_pipeline(&config).await?;

    let app = routes::router(routes::AppState::new(pipeline), &config.allowed_origins);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, db = %config.db_path.display(), "starting edgesearch server");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Wire the cache tiers, provider registry and HTTP dispatcher into one pipeline.
async fn build_pipeline(config: &AppConfig) -> Result<SearchPipeline> {
    let registry = ProviderRegistry::from_config(config)?;

    let durable = DurableStore::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let ephemeral = EphemeralTier::new(config.ephemeral_capacity_bytes(), config.ephemeral_default_ttl());
    let cache = CacheCoordinator::new(Arc::new(ephemeral), Arc::new(durable))
        .with_backfill_ttl(config.ephemeral_default_ttl());

    let dispatcher = HttpDispatcher::new(DispatchConfig::from(config))?;

    Ok(SearchPipeline::new(registry, cache, Arc::new(dispatcher)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
