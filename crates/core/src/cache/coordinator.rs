//! Two-tier cache coordination.
//!
//! Reads go ephemeral → durable, backfilling the ephemeral tier on a durable
//! hit. Writes go durable first, then ephemeral. The durable tier is the
//! source of truth: its failures propagate, while ephemeral-tier failures are
//! logged and skipped.

use std::sync::Arc;
use std::time::Duration;

use super::key::CacheKey;
use super::tier::CacheTier;
use crate::Error;

/// Ephemeral lifetime of entries backfilled from the durable tier.
pub const DEFAULT_EPHEMERAL_TTL: Duration = Duration::from_secs(60);

/// Coordinates the ephemeral and durable cache tiers.
#[derive(Clone)]
pub struct CacheCoordinator {
    ephemeral: Arc<dyn CacheTier>,
    durable: Arc<dyn CacheTier>,
    backfill_ttl: Duration,
}

impl CacheCoordinator {
    pub fn new(ephemeral: Arc<dyn CacheTier>, durable: Arc<dyn CacheTier>) -> Self {
        Self { ephemeral, durable, backfill_ttl: DEFAULT_EPHEMERAL_TTL }
    }

    /// Override the ephemeral TTL used when backfilling from the durable tier.
    pub fn with_backfill_ttl(mut self, ttl: Duration) -> Self {
        self.backfill_ttl = ttl;
        self
    }

    /// Look a key up in both tiers.
    ///
    /// Returns `Ok(None)` on a miss in both tiers.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, Error> {
        match self.ephemeral.get(key.as_str()).await {
            Ok(Some(value)) => {
                tracing::debug!(tier = self.ephemeral.name(), key = %key, "cache hit");
                return Ok(Some(value));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(tier = self.ephemeral.name(), key = %key, error = %e, "tier read failed, falling back");
            }
        }

        let Some(value) = self.durable.get(key.as_str()).await? else {
            tracing::debug!(key = %key, "cache miss");
            return Ok(None);
        };

        tracing::debug!(tier = self.durable.name(), key = %key, "cache hit");
        if let Err(e) = self.ephemeral.put(key.as_str(), &value, Some(self.backfill_ttl)).await {
            tracing::warn!(tier = self.ephemeral.name(), key = %key, error = %e, "backfill failed");
        }

        Ok(Some(value))
    }

    /// Write a value to both tiers, overwriting any previous entry.
    ///
    /// `expiration` bounds the durable entry (`None` keeps it forever);
    /// `ephemeral_ttl` bounds the ephemeral copy.
    pub async fn set(
        &self, key: &CacheKey, value: &[u8], expiration: Option<Duration>, ephemeral_ttl: Duration,
    ) -> Result<(), Error> {
        self.durable.put(key.as_str(), value, expiration).await?;

        if let Err(e) = self.ephemeral.put(key.as_str(), value, Some(ephemeral_ttl)).await {
            tracing::warn!(tier = self.ephemeral.name(), key = %key, error = %e, "tier write failed");
        }

        Ok(())
    }

    /// Remove a key from both tiers.
    pub async fn delete(&self, key: &CacheKey) -> Result<(), Error> {
        self.durable.delete(key.as_str()).await?;
        self.ephemeral.delete(key.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DurableStore, EphemeralTier};
    use crate::provider::ProviderFamily;
    use crate::query::{Category, NormalizedQuery, SafeSearch};
    use crate::derive_key;

    fn key(text: &str) -> CacheKey {
        let query = NormalizedQuery {
            encoded: format!("q={text}"),
            text: text.to_string(),
            page: 1,
            count: 20,
            offset: 0,
            country: "us".into(),
            safe_search: SafeSearch::Moderate,
        };
        derive_key(Category::News, ProviderFamily::Bing, &query)
    }

    async fn tiers() -> (Arc<EphemeralTier>, Arc<DurableStore>) {
        let ephemeral = Arc::new(EphemeralTier::new(1024 * 1024, Duration::from_secs(60)));
        let durable = Arc::new(DurableStore::open_in_memory().await.unwrap());
        (ephemeral, durable)
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (ephemeral, durable) = tiers().await;
        let cache = CacheCoordinator::new(ephemeral, durable);
        let key = key("cats");

        cache.set(&key, b"payload", None, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn test_miss_in_both_tiers() {
        let (ephemeral, durable) = tiers().await;
        let cache = CacheCoordinator::new(ephemeral, durable);
        assert!(cache.get(&key("absent")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_writes_both_tiers() {
        let (ephemeral, durable) = tiers().await;
        let cache = CacheCoordinator::new(ephemeral.clone(), durable.clone());
        let key = key("cats");

        cache.set(&key, b"v", Some(Duration::from_secs(3600)), Duration::from_secs(60)).await.unwrap();

        assert!(ephemeral.get(key.as_str()).await.unwrap().is_some());
        assert!(durable.get_entry(key.as_str()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_durable_hit_backfills_ephemeral() {
        let (ephemeral, durable) = tiers().await;
        let cache = CacheCoordinator::new(ephemeral.clone(), durable.clone());
        let key = key("cats");

        durable.put_entry(key.as_str(), b"from-durable", None).await.unwrap();
        assert!(ephemeral.get(key.as_str()).await.unwrap().is_none());

        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some(&b"from-durable"[..]));
        assert_eq!(ephemeral.get(key.as_str()).await.unwrap().as_deref(), Some(&b"from-durable"[..]));
    }

    #[tokio::test]
    async fn test_backfill_uses_short_ttl() {
        let (ephemeral, durable) = tiers().await;
        let cache =
            CacheCoordinator::new(ephemeral.clone(), durable.clone()).with_backfill_ttl(Duration::from_millis(200));
        let key = key("cats");

        durable.put_entry(key.as_str(), b"v", None).await.unwrap();
        cache.get(&key).await.unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(ephemeral.get(key.as_str()).await.unwrap().is_none());
        assert!(cache.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ephemeral_may_be_stale() {
        let (ephemeral, durable) = tiers().await;
        let cache = CacheCoordinator::new(ephemeral, durable.clone());
        let key = key("cats");

        cache.set(&key, b"old", None, Duration::from_secs(60)).await.unwrap();
        durable.put_entry(key.as_str(), b"new", None).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some(&b"old"[..]));
    }

    #[tokio::test]
    async fn test_delete_removes_both_tiers() {
        let (ephemeral, durable) = tiers().await;
        let cache = CacheCoordinator::new(ephemeral.clone(), durable.clone());
        let key = key("cats");

        cache.set(&key, b"v", None, Duration::from_secs(60)).await.unwrap();
        cache.delete(&key).await.unwrap();

        assert!(ephemeral.get(key.as_str()).await.unwrap().is_none());
        assert!(durable.get_entry(key.as_str()).await.unwrap().is_none());
        assert!(cache.get(&key).await.unwrap().is_none());
    }
}
