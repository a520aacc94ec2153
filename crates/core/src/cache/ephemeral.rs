//! In-process ephemeral tier using moka.
//!
//! Each entry carries its own lifetime, so a backfilled entry (short TTL) and
//! a freshly fetched result (long TTL) can live side by side. Capacity is
//! bounded by payload bytes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::tier::CacheTier;
use crate::Error;

#[derive(Clone)]
struct EdgeEntry {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, EdgeEntry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &EdgeEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self, _key: &String, value: &EdgeEntry, _updated_at: Instant, _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Fast, process-local cache tier.
#[derive(Clone)]
pub struct EphemeralTier {
    cache: Cache<String, EdgeEntry>,
    default_ttl: Duration,
}

impl EphemeralTier {
    /// Create a tier holding up to `capacity_bytes` of payload.
    ///
    /// `default_ttl` applies to writes that do not carry their own TTL.
    pub fn new(capacity_bytes: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity_bytes)
            .weigher(|_key: &String, entry: &EdgeEntry| u32::try_from(entry.bytes.len()).unwrap_or(u32::MAX))
            .expire_after(PerEntryTtl)
            .build();

        Self { cache, default_ttl }
    }
}

#[async_trait]
impl CacheTier for EphemeralTier {
    fn name(&self) -> &'static str {
        "ephemeral"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.cache.get(key).await.map(|entry| entry.bytes.to_vec()))
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), Error> {
        let entry = EdgeEntry { bytes: Arc::from(value), ttl: ttl.unwrap_or(self.default_ttl) };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}
