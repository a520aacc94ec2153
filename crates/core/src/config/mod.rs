//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EDGESEARCH_*)
//! 2. TOML config file (if EDGESEARCH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::provider::{BING_BASE_URL, BRAVE_BASE_URL, ProviderFamily};
use crate::query::Category;

mod validation;

pub use validation::ConfigError;

/// Provider family selected for each category.
///
/// Nested keys use `__`, e.g. `EDGESEARCH_PROVIDERS__IMAGES=brave`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProviders {
    #[serde(default)]
    pub web: ProviderFamily,
    #[serde(default)]
    pub images: ProviderFamily,
    #[serde(default)]
    pub videos: ProviderFamily,
    #[serde(default)]
    pub news: ProviderFamily,
}

impl CategoryProviders {
    pub fn get(&self, category: Category) -> ProviderFamily {
        match category {
            Category::Web => self.web,
            Category::Images => self.images,
            Category::Videos => self.videos,
            Category::News => self.news,
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (EDGESEARCH_*)
/// 2. TOML config file (if EDGESEARCH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to the SQLite database backing the durable tier.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream HTTP timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Durable-tier lifetime of a successful search response.
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,

    /// Ephemeral-tier lifetime of a successful search response.
    #[serde(default = "default_result_ttl_secs")]
    pub edge_ttl_secs: u64,

    /// Ephemeral-tier lifetime of entries backfilled from the durable tier.
    #[serde(default = "default_ephemeral_ttl_secs")]
    pub ephemeral_default_ttl_secs: u64,

    /// Ephemeral-tier capacity in megabytes of payload.
    #[serde(default = "default_ephemeral_capacity_mb")]
    pub ephemeral_capacity_mb: u64,

    /// CORS origins; a single `*` mirrors the request origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub providers: CategoryProviders,

    #[serde(default = "default_bing_base_url")]
    pub bing_base_url: String,

    #[serde(default = "default_brave_base_url")]
    pub brave_base_url: String,

    /// Bing credential for web search (EDGESEARCH_BING_SEARCH_KEY).
    #[serde(default)]
    pub bing_search_key: Option<String>,

    #[serde(default)]
    pub bing_images_key: Option<String>,

    #[serde(default)]
    pub bing_videos_key: Option<String>,

    #[serde(default)]
    pub bing_news_key: Option<String>,

    /// Brave credential shared by every category (EDGESEARCH_BRAVE_API_KEY).
    #[serde(default)]
    pub brave_api_key: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8787".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./edgesearch-cache.sqlite")
}

fn default_user_agent() -> String {
    "edgesearch/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_result_ttl_secs() -> u64 {
    864_000 // 10 days
}

fn default_ephemeral_ttl_secs() -> u64 {
    60
}

fn default_ephemeral_capacity_mb() -> u64 {
    64
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_bing_base_url() -> String {
    BING_BASE_URL.into()
}

fn default_brave_base_url() -> String {
    BRAVE_BASE_URL.into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            result_ttl_secs: default_result_ttl_secs(),
            edge_ttl_secs: default_result_ttl_secs(),
            ephemeral_default_ttl_secs: default_ephemeral_ttl_secs(),
            ephemeral_capacity_mb: default_ephemeral_capacity_mb(),
            allowed_origins: default_allowed_origins(),
            providers: CategoryProviders::default(),
            bing_base_url: default_bing_base_url(),
            brave_base_url: default_brave_base_url(),
            bing_search_key: None,
            bing_images_key: None,
            bing_videos_key: None,
            bing_news_key: None,
            brave_api_key: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn edge_ttl(&self) -> Duration {
        Duration::from_secs(self.edge_ttl_secs)
    }

    pub fn ephemeral_default_ttl(&self) -> Duration {
        Duration::from_secs(self.ephemeral_default_ttl_secs)
    }

    pub fn ephemeral_capacity_bytes(&self) -> u64 {
        self.ephemeral_capacity_mb * 1024 * 1024
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `EDGESEARCH_`
    /// 2. TOML file from `EDGESEARCH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EDGESEARCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("EDGESEARCH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Bing credential for `category`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key for that category is not set.
    pub fn require_bing_key(&self, category: Category) -> Result<&str, ConfigError> {
        let (key, field) = match category {
            Category::Web => (&self.bing_search_key, "bing_search_key"),
            Category::Images => (&self.bing_images_key, "bing_images_key"),
            Category::Videos => (&self.bing_videos_key, "bing_videos_key"),
            Category::News => (&self.bing_news_key, "bing_news_key"),
        };

        key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: field.into(),
            hint: format!("Set EDGESEARCH_{} environment variable", field.to_uppercase()),
        })
    }

    /// Brave credential, shared across categories.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the Brave API key is not set.
    pub fn require_brave_api_key(&self) -> Result<&str, ConfigError> {
        self.brave_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "brave_api_key".into(),
            hint: "Set EDGESEARCH_BRAVE_API_KEY environment variable".into(),
        })
    }
}
