//! Integration tests for HttpDispatcher using wiremock

use std::time::Duration;

use edgesearch_client::{DispatchConfig, DispatchError, HttpDispatcher};
use edgesearch_core::{Category, ProviderConfig, ProviderDispatcher, ProviderFamily, SearchRequest, normalize};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(timeout: Duration) -> HttpDispatcher {
    HttpDispatcher::new(DispatchConfig { user_agent: "edgesearch-test/1".into(), timeout }).unwrap()
}

fn request(category: Category, text: &str) -> SearchRequest {
    SearchRequest {
        category,
        query: Some(text.into()),
        page: Some("1".into()),
        country_signal: Some("de".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_bing_web_request_shape() {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({"webPages": {"value": [{"name": "Cats", "url": "https://cats.test"}]}});

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("Ocp-Apim-Subscription-Key", "bing-web-key"))
        .and(header("User-Agent", "edgesearch-test/1"))
        .and(query_param("q", "cats"))
        .and(query_param("count", "20"))
        .and(query_param("offset", "0"))
        .and(query_param("cc", "de"))
        .and(query_param("setLang", "de"))
        .and(query_param("safeSearch", "Moderate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = ProviderConfig::new(ProviderFamily::Bing, Category::Web, &mock_server.uri(), "bing-web-key");
    let query = normalize(&request(Category::Web, "Cats"), &provider).unwrap();

    let payload = dispatcher(Duration::from_secs(5)).fetch(Category::Web, &query, &provider).await;
    assert_eq!(payload, Some(body));
}

#[tokio::test]
async fn test_brave_images_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(header("X-Subscription-Token", "brave-key"))
        .and(query_param("q", "cats"))
        .and(query_param("count", "100"))
        .and(query_param("country", "de"))
        .and(query_param("safesearch", "strict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = ProviderConfig::new(ProviderFamily::Brave, Category::Images, &mock_server.uri(), "brave-key");
    let query = normalize(&request(Category::Images, "cats"), &provider).unwrap();

    let payload = dispatcher(Duration::from_secs(5)).fetch(Category::Images, &query, &provider).await;
    assert_eq!(payload, Some(serde_json::json!({"results": []})));
}

#[tokio::test]
async fn test_server_error_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})))
        .mount(&mock_server)
        .await;

    let provider = ProviderConfig::new(ProviderFamily::Bing, Category::News, &mock_server.uri(), "k");
    let query = normalize(&request(Category::News, "cats"), &provider).unwrap();
    let dispatcher = dispatcher(Duration::from_secs(5));

    assert!(matches!(
        dispatcher.try_fetch(&query, &provider).await,
        Err(DispatchError::HttpError { status: 500 })
    ));
    assert!(dispatcher.fetch(Category::News, &query, &provider).await.is_none());
}

#[tokio::test]
async fn test_auth_and_rate_limit_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher(Duration::from_secs(5));

    let web = ProviderConfig::new(ProviderFamily::Bing, Category::Web, &mock_server.uri(), "revoked");
    let query = normalize(&request(Category::Web, "cats"), &web).unwrap();
    assert!(matches!(
        dispatcher.try_fetch(&query, &web).await,
        Err(DispatchError::AuthError { status: 401 })
    ));

    let videos = ProviderConfig::new(ProviderFamily::Bing, Category::Videos, &mock_server.uri(), "k");
    let query = normalize(&request(Category::Videos, "cats"), &videos).unwrap();
    assert!(matches!(dispatcher.try_fetch(&query, &videos).await, Err(DispatchError::RateLimited)));
}

#[tokio::test]
async fn test_non_json_body_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let provider = ProviderConfig::new(ProviderFamily::Bing, Category::Web, &mock_server.uri(), "k");
    let query = normalize(&request(Category::Web, "cats"), &provider).unwrap();
    let dispatcher = dispatcher(Duration::from_secs(5));

    assert!(matches!(dispatcher.try_fetch(&query, &provider).await, Err(DispatchError::Parse(_))));
    assert!(dispatcher.fetch(Category::Web, &query, &provider).await.is_none());
}

#[tokio::test]
async fn test_timeout_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let provider = ProviderConfig::new(ProviderFamily::Bing, Category::Web, &mock_server.uri(), "k");
    let query = normalize(&request(Category::Web, "cats"), &provider).unwrap();
    let dispatcher = dispatcher(Duration::from_millis(200));

    assert!(matches!(dispatcher.try_fetch(&query, &provider).await, Err(DispatchError::Timeout)));
}

#[tokio::test]
async fn test_unreachable_provider_is_none() {
    let provider = ProviderConfig::new(ProviderFamily::Bing, Category::Web, "http://127.0.0.1:1", "k");
    let query = normalize(&request(Category::Web, "cats"), &provider).unwrap();

    assert!(dispatcher(Duration::from_secs(2)).fetch(Category::Web, &query, &provider).await.is_none());
}
