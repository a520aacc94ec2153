//! Cache tier abstraction.

use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

/// A single key-value cache tier.
///
/// Writes overwrite unconditionally. A `ttl` of `None` means the tier's own
/// default: the ephemeral tier uses its configured lifetime, the durable tier
/// keeps the entry forever.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    async fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;
}
