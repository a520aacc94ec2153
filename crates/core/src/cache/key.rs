//! Cache key derivation.

use std::fmt;

use sha2::{Digest, Sha512};

use crate::Error;
use crate::provider::ProviderFamily;
use crate::query::{Category, NormalizedQuery};

/// Length of the hex-encoded SHA-512 digest at the end of every key.
pub const DIGEST_HEX_LEN: usize = 128;

/// Deterministic key identifying one cached provider response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Accept a key produced elsewhere (e.g. typed into the admin CLI).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] unless the key has the
    /// `<namespace>_..._<128 hex chars>` shape produced by [`derive_key`].
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        let valid = raw.rsplit_once('_').is_some_and(|(namespace, digest)| {
            !namespace.is_empty()
                && namespace.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                && digest.len() == DIGEST_HEX_LEN
                && digest.chars().all(|c| c.is_ascii_hexdigit())
        });

        if valid { Ok(Self(raw.to_string())) } else { Err(Error::InvalidKey(raw.to_string())) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a normalized query.
///
/// The digest covers the provider identity and the encoded query. Web results
/// are additionally namespaced by country and safe search, since their payload
/// shape depends on both.
pub fn derive_key(category: Category, provider: ProviderFamily, query: &NormalizedQuery) -> CacheKey {
    let mut hasher = Sha512::new();
    hasher.update(provider.id().as_bytes());
    hasher.update(b"\n");
    hasher.update(query.encoded.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let key = match category {
        Category::Web => format!("{}_{}_{}_{}", category.cache_namespace(), query.country, query.safe_search, digest),
        _ => format!("{}_{}", category.cache_namespace(), digest),
    };

    CacheKey(key)
}
