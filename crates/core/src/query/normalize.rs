//! Request normalization.
//!
//! Produces the canonical, provider-dialect encoding of a [`SearchRequest`].
//! Two requests with the same semantic content normalize to byte-identical
//! output for the same provider, which is what makes the cache key stable.

use url::form_urlencoded;

use super::{Category, SafeSearch, SearchRequest};
use crate::Error;
use crate::provider::{ProviderConfig, ProviderFamily};

/// Highest page a client may request; anything else is clamped to 1.
pub const MAX_PAGE: u32 = 10;

/// Country used when neither the request nor the edge supplies a usable one.
pub const DEFAULT_COUNTRY: &str = "us";

/// Canonical provider-specific encoding of a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Encoded parameter string appended to the provider endpoint.
    pub encoded: String,
    /// Case-folded query text.
    pub text: String,
    pub page: u32,
    pub count: u32,
    pub offset: u32,
    /// Lower-case country code that was sent upstream.
    pub country: String,
    /// Effective safe search level, after provider quirks.
    pub safe_search: SafeSearch,
}

/// Normalize a raw request for the given provider.
///
/// # Errors
///
/// Returns [`Error::MissingQuery`] when the query text is absent or blank.
pub fn normalize(raw: &SearchRequest, provider: &ProviderConfig) -> Result<NormalizedQuery, Error> {
    let text = raw
        .query
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty())
        .ok_or(Error::MissingQuery)?;

    let page = parse_page(raw.page.as_deref());
    let count = provider.count;
    let offset = count * (page - 1);

    let country = resolve_country(raw.country.as_deref(), raw.country_signal.as_deref(), provider.supported_countries);

    let mut safe_search = SafeSearch::parse_or_default(raw.safe_search.as_deref());
    if provider.strict_images && raw.category == Category::Images && safe_search == SafeSearch::Moderate {
        safe_search = SafeSearch::Strict;
    }

    let encoded = encode(provider.family, &text, count, offset, &country, safe_search);

    Ok(NormalizedQuery { encoded, text, page, count, offset, country, safe_search })
}

/// Parse a page number, clamping anything outside `1..=MAX_PAGE` to 1.
fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| (1..=MAX_PAGE).contains(p))
        .unwrap_or(1)
}

/// Pick the first usable country from the explicit parameter, then the edge
/// signal, then the default.
fn resolve_country(explicit: Option<&str>, signal: Option<&str>, supported: Option<&[&str]>) -> String {
    [explicit, signal]
        .into_iter()
        .flatten()
        .map(|c| c.trim().to_ascii_lowercase())
        .find(|c| !c.is_empty() && supported.is_none_or(|list| list.contains(&c.as_str())))
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
}

fn encode(family: ProviderFamily, text: &str, count: u32, offset: u32, country: &str, safe: SafeSearch) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("q", text).append_pair("count", &count.to_string()).append_pair("offset", &offset.to_string());

    match family {
        ProviderFamily::Bing => {
            let safe = match safe {
                SafeSearch::Off => "Off",
                SafeSearch::Moderate => "Moderate",
                SafeSearch::Strict => "Strict",
            };
            params.append_pair("cc", country).append_pair("setLang", country).append_pair("safeSearch", safe);
        }
        ProviderFamily::Brave => {
            params.append_pair("country", country).append_pair("safesearch", safe.as_str());
        }
    }

    params.finish()
}
