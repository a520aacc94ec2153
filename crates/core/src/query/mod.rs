//! Search request types.
//!
//! [`SearchRequest`] carries the raw, provider-agnostic parameters of one
//! incoming call. [`normalize`] turns it into a provider-specific
//! [`NormalizedQuery`].

mod normalize;

pub use normalize::{DEFAULT_COUNTRY, MAX_PAGE, NormalizedQuery, normalize};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::abuse::AbuseSignal;

/// Result category served by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Web,
    Images,
    Videos,
    News,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Web, Category::Images, Category::Videos, Category::News];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Web => "web",
            Category::Images => "images",
            Category::Videos => "videos",
            Category::News => "news",
        }
    }

    /// Prefix used for cache keys of this category.
    pub fn cache_namespace(&self) -> &'static str {
        match self {
            Category::Web => "search",
            Category::Images => "searchImages",
            Category::Videos => "searchVideos",
            Category::News => "searchNews",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "search" => Ok(Category::Web),
            "images" => Ok(Category::Images),
            "videos" => Ok(Category::Videos),
            "news" => Ok(Category::News),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Safe search filtering levels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl SafeSearch {
    /// Parse a user-supplied level, falling back to `Moderate` for anything
    /// missing or unrecognised.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("off") => SafeSearch::Off,
            Some("strict") => SafeSearch::Strict,
            _ => SafeSearch::Moderate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SafeSearch::Off => "off",
            SafeSearch::Moderate => "moderate",
            SafeSearch::Strict => "strict",
        }
    }
}

impl fmt::Display for SafeSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw parameters of one incoming search call.
///
/// Values are kept exactly as received; all defaulting and clamping happens in
/// [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub category: Category,
    /// Query text (`q`).
    pub query: Option<String>,
    /// Page number (`p`), expected 1-10.
    pub page: Option<String>,
    /// Explicit country code (`c`, or `m` as an alias).
    pub country: Option<String>,
    /// Country derived from the request itself (e.g. `cf-ipcountry`).
    pub country_signal: Option<String>,
    /// Safe search level (`s`).
    pub safe_search: Option<String>,
    pub signals: AbuseSignal,
}

impl SearchRequest {
    /// Read the recognised query-string parameters for `category`.
    pub fn from_params(category: Category, params: &HashMap<String, String>) -> Self {
        Self {
            category,
            query: params.get("q").cloned(),
            page: params.get("p").cloned(),
            country: params.get("c").or_else(|| params.get("m")).cloned(),
            safe_search: params.get("s").cloned(),
            ..Default::default()
        }
    }

    pub fn with_country_signal(mut self, signal: Option<String>) -> Self {
        self.country_signal = signal;
        self
    }

    pub fn with_signals(mut self, signals: AbuseSignal) -> Self {
        self.signals = signals;
        self
    }
}
