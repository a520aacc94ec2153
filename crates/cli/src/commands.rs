//! Admin subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use edgesearch_core::{
    AppConfig, CacheKey, Category, DurableStore, ProviderRegistry, SearchRequest, derive_key, normalize,
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the cache key the server derives for a request
    Key(KeyArgs),

    /// Print the cached payload stored under a key
    Get {
        /// Cache key, as printed by `key`
        key: String,
    },

    /// Remove one entry from the durable cache
    Delete {
        /// Cache key, as printed by `key`
        key: String,
    },

    /// Remove every expired entry from the durable cache
    PurgeExpired,
}

/// Request parameters, named after the query-string parameters they mirror.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// web, images, videos or news
    #[arg(long, default_value = "web")]
    pub category: Category,

    /// Query text (`q`)
    #[arg(long)]
    pub query: String,

    /// Page number (`p`)
    #[arg(long)]
    pub page: Option<String>,

    /// Explicit country code (`c`)
    #[arg(long)]
    pub country: Option<String>,

    /// Safe-search level (`s`)
    #[arg(long)]
    pub safe: Option<String>,

    /// Geo-located country of the caller (`cf-ipcountry`)
    #[arg(long)]
    pub signal: Option<String>,
}

/// Command result; `NotFound` maps to a non-zero exit status.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Found(String),
    NotFound(String),
}

pub async fn run(config: &AppConfig, command: Command) -> Result<Outcome> {
    match command {
        Command::Key(args) => Ok(Outcome::Found(key_for(config, &args)?.to_string())),
        Command::Get { key } => get(&open_store(config).await?, &key).await,
        Command::Delete { key } => delete(&open_store(config).await?, &key).await,
        Command::PurgeExpired => purge_expired(&open_store(config).await?).await,
    }
}

async fn open_store(config: &AppConfig) -> Result<DurableStore> {
    DurableStore::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))
}

/// Derive the key exactly as the server would for these parameters.
pub fn key_for(config: &AppConfig, args: &KeyArgs) -> Result<CacheKey> {
    let registry = ProviderRegistry::without_credentials(config);
    let provider = registry.get(args.category);

    let request = SearchRequest {
        category: args.category,
        query: Some(args.query.clone()),
        page: args.page.clone(),
        country: args.country.clone(),
        country_signal: args.signal.clone(),
        safe_search: args.safe.clone(),
        ..Default::default()
    };

    let query = normalize(&request, provider)?;
    Ok(derive_key(args.category, provider.family, &query))
}

pub async fn get(store: &DurableStore, key: &str) -> Result<Outcome> {
    let key = CacheKey::parse(key)?;

    let Some(bytes) = store.get_entry(key.as_str()).await? else {
        return Ok(Outcome::NotFound(format!("no cached entry for {key}")));
    };

    let text = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(payload) => serde_json::to_string_pretty(&payload)?,
        Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
    };
    Ok(Outcome::Found(text))
}

pub async fn delete(store: &DurableStore, key: &str) -> Result<Outcome> {
    let key = CacheKey::parse(key)?;

    if store.delete_entry(key.as_str()).await? {
        tracing::info!(key = %key, "cache entry deleted");
        Ok(Outcome::Found(format!("deleted {key}")))
    } else {
        Ok(Outcome::NotFound(format!("no cached entry for {key}")))
    }
}

pub async fn purge_expired(store: &DurableStore) -> Result<Outcome> {
    let deleted = store.purge_expired().await?;
    tracing::info!(deleted, "expired cache entries purged");
    Ok(Outcome::Found(format!("purged {deleted} expired entries")))
}
