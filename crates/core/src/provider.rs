//! Provider registry.
//!
//! Each category resolves to one [`ProviderConfig`]: endpoint, credential,
//! page size, TTLs and dialect quirks for a concrete upstream. The network
//! call itself sits behind the [`ProviderDispatcher`] trait.
//!
//! | Family | Auth header                 | Credentials            |
//! |--------|-----------------------------|------------------------|
//! | Bing   | `Ocp-Apim-Subscription-Key` | one key per category   |
//! | Brave  | `X-Subscription-Token`      | one key for everything |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, ConfigError};
use crate::query::{Category, NormalizedQuery};

/// Default Bing endpoint root.
pub const BING_BASE_URL: &str = "https://api.bing.microsoft.com/v7.0";

/// Default Brave endpoint root.
pub const BRAVE_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Default lifetime of a cached provider response (10 days).
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(864_000);

/// Country codes accepted by Brave.
const BRAVE_COUNTRIES: &[&str] = &[
    "ar", "au", "at", "be", "br", "ca", "cl", "dk", "fi", "fr", "de", "hk", "in", "id", "it", "jp", "kr", "my",
    "mx", "nl", "nz", "no", "cn", "pl", "pt", "ph", "ru", "sa", "za", "es", "se", "ch", "tw", "tr", "gb", "us",
];

/// Upstream search API family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    #[default]
    Bing,
    Brave,
}

impl ProviderFamily {
    /// Stable identity used when deriving cache keys.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderFamily::Bing => "bing",
            ProviderFamily::Brave => "brave",
        }
    }

    pub fn auth_header(&self) -> &'static str {
        match self {
            ProviderFamily::Bing => "Ocp-Apim-Subscription-Key",
            ProviderFamily::Brave => "X-Subscription-Token",
        }
    }

    fn endpoint_path(&self, category: Category) -> &'static str {
        match (self, category) {
            (ProviderFamily::Bing, Category::Web) => "/search",
            (ProviderFamily::Brave, Category::Web) => "/web/search",
            (_, Category::Images) => "/images/search",
            (_, Category::Videos) => "/videos/search",
            (_, Category::News) => "/news/search",
        }
    }

    fn results_per_page(&self, category: Category) -> u32 {
        match (self, category) {
            (ProviderFamily::Bing, _) => 20,
            (ProviderFamily::Brave, Category::Web) => 20,
            (ProviderFamily::Brave, Category::Images) => 100,
            (ProviderFamily::Brave, Category::Videos | Category::News) => 50,
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything needed to call one provider for one category.
#[derive(Clone)]
pub struct ProviderConfig {
    pub family: ProviderFamily,
    pub category: Category,
    /// Full endpoint URL, without query string.
    pub endpoint: String,
    pub credential: String,
    /// Results requested per page.
    pub count: u32,
    /// Country allow-list; `None` passes any value through.
    pub supported_countries: Option<&'static [&'static str]>,
    /// Upgrade `moderate` safe search to `strict` for image searches.
    pub strict_images: bool,
    /// Durable-tier lifetime of a successful response.
    pub result_ttl: Duration,
    /// Ephemeral-tier lifetime of a successful response.
    pub edge_ttl: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("family", &self.family)
            .field("category", &self.category)
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("count", &self.count)
            .field("strict_images", &self.strict_images)
            .field("result_ttl", &self.result_ttl)
            .field("edge_ttl", &self.edge_ttl)
            .finish()
    }
}

impl ProviderConfig {
    /// Build the adapter for `family` serving `category` under `base_url`.
    pub fn new(family: ProviderFamily, category: Category, base_url: &str, credential: impl Into<String>) -> Self {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), family.endpoint_path(category));
        let (supported_countries, strict_images) = match family {
            ProviderFamily::Bing => (None, false),
            ProviderFamily::Brave => (Some(BRAVE_COUNTRIES), true),
        };

        Self {
            family,
            category,
            endpoint,
            credential: credential.into(),
            count: family.results_per_page(category),
            supported_countries,
            strict_images,
            result_ttl: DEFAULT_RESULT_TTL,
            edge_ttl: DEFAULT_RESULT_TTL,
        }
    }

    pub fn with_ttls(mut self, result_ttl: Duration, edge_ttl: Duration) -> Self {
        self.result_ttl = result_ttl;
        self.edge_ttl = edge_ttl;
        self
    }

    /// Endpoint with the normalized query appended.
    pub fn request_url(&self, query: &NormalizedQuery) -> String {
        format!("{}?{}", self.endpoint, query.encoded)
    }
}

/// Category to provider mapping.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    web: ProviderConfig,
    images: ProviderConfig,
    videos: ProviderConfig,
    news: ProviderConfig,
}

impl ProviderRegistry {
    pub fn new(web: ProviderConfig, images: ProviderConfig, videos: ProviderConfig, news: ProviderConfig) -> Self {
        Self { web, images, videos, news }
    }

    /// Build the registry from application configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when a category is routed to a provider
    /// whose credential is not configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let build = |category: Category| -> Result<ProviderConfig, ConfigError> {
            let family = config.providers.get(category);
            let (base_url, credential) = match family {
                ProviderFamily::Bing => (config.bing_base_url.as_str(), config.require_bing_key(category)?),
                ProviderFamily::Brave => (config.brave_base_url.as_str(), config.require_brave_api_key()?),
            };
            Ok(ProviderConfig::new(family, category, base_url, credential)
                .with_ttls(config.result_ttl(), config.edge_ttl()))
        };

        Ok(Self::new(build(Category::Web)?, build(Category::Images)?, build(Category::Videos)?, build(Category::News)?))
    }

    /// Same routing as [`from_config`](Self::from_config) with empty credentials.
    ///
    /// Enough to normalize queries and derive cache keys offline; never dispatch through it.
    pub fn without_credentials(config: &AppConfig) -> Self {
        let build = |category: Category| {
            let family = config.providers.get(category);
            let base_url = match family {
                ProviderFamily::Bing => config.bing_base_url.as_str(),
                ProviderFamily::Brave => config.brave_base_url.as_str(),
            };
            ProviderConfig::new(family, category, base_url, String::new()).with_ttls(config.result_ttl(), config.edge_ttl())
        };

        Self::new(build(Category::Web), build(Category::Images), build(Category::Videos), build(Category::News))
    }

    pub fn get(&self, category: Category) -> &ProviderConfig {
        match category {
            Category::Web => &self.web,
            Category::Images => &self.images,
            Category::Videos => &self.videos,
            Category::News => &self.news,
        }
    }
}

/// Performs the upstream call for a normalized query.
///
/// Implementations never surface transport errors: any failure is reported
/// as `None`.
#[async_trait]
pub trait ProviderDispatcher: Send + Sync {
    async fn fetch(
        &self, category: Category, query: &NormalizedQuery, provider: &ProviderConfig,
    ) -> Option<serde_json::Value>;
}
