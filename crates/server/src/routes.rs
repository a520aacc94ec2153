//! HTTP routes.
//!
//! Each category is served on a canonical path and a legacy alias, both
//! accepting GET and POST. Parameters are always read from the query string.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get};
use edgesearch_core::{AbuseSignal, Category, SearchPipeline, SearchRequest};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::envelope::Envelope;

/// Header carrying the edge's bot verdict.
const KNOWN_BOT_HEADER: &str = "x-known-bot";
/// Header carrying the edge's threat score.
const THREAT_SCORE_HEADER: &str = "x-threat-score";
/// Header carrying the client's geo-located country.
const COUNTRY_HEADER: &str = "cf-ipcountry";

/// Preflight cache lifetime.
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
}

impl AppState {
    pub fn new(pipeline: SearchPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

/// Build the application router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/search/web", category_route(Category::Web))
        .route("/search", category_route(Category::Web))
        .route("/images", category_route(Category::Images))
        .route("/searchImages", category_route(Category::Images))
        .route("/videos", category_route(Category::Videos))
        .route("/searchVideos", category_route(Category::Videos))
        .route("/news", category_route(Category::News))
        .route("/searchNews", category_route(Category::News))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn category_route(category: Category) -> MethodRouter<AppState> {
    let handler = move |state: State<AppState>, params: Query<HashMap<String, String>>, headers: HeaderMap| {
        search(category, state, params, headers)
    };
    get(handler.clone()).post(handler)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Build the pipeline input from the query string and the edge headers.
fn search_request(category: Category, params: &HashMap<String, String>, headers: &HeaderMap) -> SearchRequest {
    let signals = AbuseSignal::from_headers(
        header_str(headers, KNOWN_BOT_HEADER),
        header_str(headers, THREAT_SCORE_HEADER),
    );

    SearchRequest::from_params(category, params)
        .with_country_signal(header_str(headers, COUNTRY_HEADER).map(str::to_string))
        .with_signals(signals)
}

async fn search(
    category: Category, State(state): State<AppState>, Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request = search_request(category, &params, &headers);

    match state.pipeline.run(request).await {
        Ok(hit) => {
            tracing::debug!(category = %category, cache_hit = hit.cache_hit, "search served");
            Envelope::success(hit.payload).into_response()
        }
        Err(e) => {
            tracing::debug!(category = %category, code = e.envelope_code(), error = %e, "search rejected");
            Envelope::failure(&e).into_response()
        }
    }
}

/// CORS policy: a `*` entry mirrors the caller's origin, anything else is an allow-list.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "invalid CORS origin in config; skipping");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}
