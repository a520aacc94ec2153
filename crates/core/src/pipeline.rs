//! The search pipeline.
//!
//! `abuse gate → normalize → derive key → cache get → (miss) dispatch →
//! cache set`. One pipeline serves every category; the differences between
//! providers live entirely in the [`ProviderRegistry`].

use std::sync::Arc;

use crate::Error;
use crate::abuse::{Admission, admit};
use crate::cache::{CacheCoordinator, CacheKey, derive_key};
use crate::provider::{ProviderConfig, ProviderDispatcher, ProviderRegistry};
use crate::query::{SearchRequest, normalize};

/// Successful pipeline result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Provider payload, passed through untouched.
    pub payload: serde_json::Value,
    pub key: CacheKey,
    pub cache_hit: bool,
}

/// Shared, long-lived pipeline state.
#[derive(Clone)]
pub struct SearchPipeline {
    registry: ProviderRegistry,
    cache: CacheCoordinator,
    dispatcher: Arc<dyn ProviderDispatcher>,
}

/// Everything one request needs, built at entry and dropped with the response.
pub struct RequestContext<'p> {
    request: SearchRequest,
    provider: &'p ProviderConfig,
    cache: &'p CacheCoordinator,
    dispatcher: &'p dyn ProviderDispatcher,
}

impl SearchPipeline {
    pub fn new(registry: ProviderRegistry, cache: CacheCoordinator, dispatcher: Arc<dyn ProviderDispatcher>) -> Self {
        Self { registry, cache, dispatcher }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheCoordinator {
        &self.cache
    }

    /// Build the per-request context for `request`.
    pub fn context(&self, request: SearchRequest) -> RequestContext<'_> {
        RequestContext {
            provider: self.registry.get(request.category),
            cache: &self.cache,
            dispatcher: self.dispatcher.as_ref(),
            request,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// # Errors
    ///
    /// - [`Error::Blocked`] when the abuse gate rejects the request
    /// - [`Error::MissingQuery`] when the query text is absent
    /// - [`Error::UpstreamUnavailable`] when the provider call fails
    /// - cache tier errors, propagated unchanged
    pub async fn run(&self, request: SearchRequest) -> Result<SearchHit, Error> {
        self.context(request).run().await
    }
}

impl RequestContext<'_> {
    pub async fn run(self) -> Result<SearchHit, Error> {
        if admit(&self.request.signals) == Admission::Reject {
            tracing::debug!(category = %self.request.category, "request blocked by abuse gate");
            return Err(Error::Blocked);
        }

        let category = self.request.category;
        let query = normalize(&self.request, self.provider)?;
        let key = derive_key(category, self.provider.family, &query);

        if let Some(bytes) = self.cache.get(&key).await? {
            match serde_json::from_slice(&bytes) {
                Ok(payload) => return Ok(SearchHit { payload, key, cache_hit: true }),
                Err(e) => tracing::warn!(key = %key, error = %e, "cached payload is not valid JSON, refetching"),
            }
        }

        tracing::info!(
            category = %category,
            provider = %self.provider.family,
            page = query.page,
            country = %query.country,
            "dispatching to provider"
        );

        let payload = self
            .dispatcher
            .fetch(category, &query, self.provider)
            .await
            .ok_or_else(|| Error::UpstreamUnavailable(format!("{} {} search failed", self.provider.family, category)))?;

        let bytes = serde_json::to_vec(&payload).map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;
        self.cache.set(&key, &bytes, Some(self.provider.result_ttl), self.provider.edge_ttl).await?;

        Ok(SearchHit { payload, key, cache_hit: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abuse::AbuseSignal;
    use crate::cache::{CacheTier, DurableStore, EphemeralTier};
    use crate::provider::ProviderFamily;
    use crate::query::{Category, NormalizedQuery};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Dispatcher that records calls and answers from a fixed script.
    struct FakeDispatcher {
        calls: AtomicUsize,
        response: Option<serde_json::Value>,
        last_query: Mutex<Option<NormalizedQuery>>,
    }

    impl FakeDispatcher {
        fn returning(response: Option<serde_json::Value>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), response, last_query: Mutex::new(None) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderDispatcher for FakeDispatcher {
        async fn fetch(
            &self, _category: Category, query: &NormalizedQuery, _provider: &ProviderConfig,
        ) -> Option<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            self.response.clone()
        }
    }

    fn registry() -> ProviderRegistry {
        let bing = |category| ProviderConfig::new(ProviderFamily::Bing, category, "https://bing.test", "key");
        ProviderRegistry::new(bing(Category::Web), bing(Category::Images), bing(Category::Videos), bing(Category::News))
    }

    async fn pipeline(dispatcher: Arc<FakeDispatcher>) -> (SearchPipeline, Arc<DurableStore>) {
        let durable = Arc::new(DurableStore::open_in_memory().await.unwrap());
        let ephemeral = Arc::new(EphemeralTier::new(1024 * 1024, Duration::from_secs(60)));
        let cache = CacheCoordinator::new(ephemeral, durable.clone());
        (SearchPipeline::new(registry(), cache, dispatcher), durable)
    }

    fn cats() -> SearchRequest {
        SearchRequest {
            category: Category::Web,
            query: Some("cats".into()),
            page: Some("1".into()),
            country_signal: Some("de".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let payload = json!({"webPages": {"value": [{"name": "Cats"}]}});
        let dispatcher = FakeDispatcher::returning(Some(payload.clone()));
        let (pipeline, durable) = pipeline(dispatcher.clone()).await;

        let first = pipeline.run(cats()).await.unwrap();
        assert!(!first.cache_hit);
        assert_eq!(first.payload, payload);
        assert_eq!(dispatcher.calls(), 1);

        let sent = dispatcher.last_query.lock().unwrap().clone().unwrap();
        assert_eq!((sent.count, sent.offset, sent.country.as_str()), (20, 0, "de"));
        assert!(first.key.as_str().starts_with("search_de_moderate_"));
        assert!(durable.get_entry(first.key.as_str()).await.unwrap().is_some());

        let second = pipeline.run(cats()).await.unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.payload, payload);
        assert_eq!(second.key, first.key);
        assert_eq!(dispatcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_preseeded_cache_never_dispatches() {
        let dispatcher = FakeDispatcher::returning(Some(json!({"fresh": true})));
        let (pipeline, _) = pipeline(dispatcher.clone()).await;

        let provider = pipeline.registry().get(Category::Web);
        let key = derive_key(Category::Web, provider.family, &normalize(&cats(), provider).unwrap());
        pipeline.cache().set(&key, br#"{"cached":true}"#, None, Duration::from_secs(60)).await.unwrap();

        let hit = pipeline.run(cats()).await.unwrap();
        assert!(hit.cache_hit);
        assert_eq!(hit.payload, json!({"cached": true}));
        assert_eq!(dispatcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_query_touches_nothing() {
        let dispatcher = FakeDispatcher::returning(Some(json!({})));
        let (pipeline, _) = pipeline(dispatcher.clone()).await;

        let req = SearchRequest { query: None, ..cats() };
        assert!(matches!(pipeline.run(req).await, Err(Error::MissingQuery)));
        assert_eq!(dispatcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_abuse_gate_precedes_validation() {
        let dispatcher = FakeDispatcher::returning(Some(json!({})));
        let (pipeline, _) = pipeline(dispatcher.clone()).await;

        let bot = cats().with_signals(AbuseSignal { known_bot: true, threat_score: 0.0 });
        assert!(matches!(pipeline.run(bot).await, Err(Error::Blocked)));

        let risky = cats().with_signals(AbuseSignal { known_bot: false, threat_score: 11.0 });
        assert!(matches!(pipeline.run(risky).await, Err(Error::Blocked)));

        let bot_without_query = SearchRequest { query: None, ..cats() }.with_signals(AbuseSignal {
            known_bot: true,
            threat_score: 0.0,
        });
        assert!(matches!(pipeline.run(bot_without_query).await, Err(Error::Blocked)));

        assert_eq!(dispatcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_not_cached() {
        let dispatcher = FakeDispatcher::returning(None);
        let (pipeline, durable) = pipeline(dispatcher.clone()).await;

        let err = pipeline.run(cats()).await.unwrap_err();
        assert_eq!(err.envelope_code(), 1105);

        let provider = pipeline.registry().get(Category::Web);
        let key = derive_key(Category::Web, provider.family, &normalize(&cats(), provider).unwrap());
        assert!(pipeline.cache().get(&key).await.unwrap().is_none());
        assert!(durable.get_entry(key.as_str()).await.unwrap().is_none());

        assert!(pipeline.run(cats()).await.is_err());
        assert_eq!(dispatcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_refetched() {
        let dispatcher = FakeDispatcher::returning(Some(json!({"ok": 1})));
        let (pipeline, durable) = pipeline(dispatcher.clone()).await;

        let provider = pipeline.registry().get(Category::Web);
        let key = derive_key(Category::Web, provider.family, &normalize(&cats(), provider).unwrap());
        durable.put(key.as_str(), b"not json", None).await.unwrap();

        let hit = pipeline.run(cats()).await.unwrap();
        assert!(!hit.cache_hit);
        assert_eq!(dispatcher.calls(), 1);
        assert_eq!(durable.get_entry(key.as_str()).await.unwrap().unwrap(), br#"{"ok":1}"#);
    }

    #[tokio::test]
    async fn test_categories_do_not_share_entries() {
        let dispatcher = FakeDispatcher::returning(Some(json!({"any": true})));
        let (pipeline, _) = pipeline(dispatcher.clone()).await;

        pipeline.run(cats()).await.unwrap();
        pipeline.run(SearchRequest { category: Category::Images, ..cats() }).await.unwrap();
        assert_eq!(dispatcher.calls(), 2);
    }
}
