// Integration tests for the imdbapi.dev client against a local mock server

use std::time::{Duration, Instant};

use deebee::error::LookupError;
use deebee::metadata::{ClientSettings, ImdbClient, MatchResult, MediaKind, MetadataSource, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: &str) -> ImdbClient {
    ImdbClient::new(ClientSettings {
        base_url: base_url.to_string(),
        api_key: Some("test-key".into()),
        retry: RetryPolicy::immediate(3),
        ..ClientSettings::default()
    })
    .unwrap()
}

/// The blocking client must not run (or be dropped) on a runtime thread.
async fn blocking<T, F>(base_url: String, call: F) -> T
where
    F: FnOnce(&ImdbClient) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&client(&base_url)))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_sends_query_and_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .and(query_param("query", "Inception"))
        .and(query_param("limit", "5"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [
                {"id": "tt1375666", "type": "movie", "primaryTitle": "Inception", "startYear": 2010},
                {"id": "tt5295894", "type": "tvSeries", "primaryTitle": "Inception: The Cobol Job"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = blocking(server.uri(), |c| c.search_titles("Inception", 5))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "tt1375666");
    assert_eq!(results[0].year, Some(2010));
    assert_eq!(results[0].kind, MediaKind::Movie);
    assert_eq!(results[1].kind, MediaKind::Series);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_results_are_truncated_to_limit() {
    let server = MockServer::start().await;
    let titles: Vec<_> = (0..8)
        .map(|i| json!({"id": format!("tt{i}"), "primaryTitle": "Crash"}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "titles": titles })))
        .mount(&server)
        .await;

    let results = blocking(server.uri(), |c| c.search_titles("Crash", 3))
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_errors_are_retried_then_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [{"id": "tt0113277", "primaryTitle": "Heat", "startYear": 1995}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = blocking(server.uri(), |c| c.search_titles("Heat", 5))
        .await
        .unwrap();
    assert_eq!(results[0].title, "Heat");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limit_honours_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"titles": []})))
        .expect(1)
        .mount(&server)
        .await;

    let results = blocking(server.uri(), |c| c.search_titles("Heat", 5))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_long_retry_after_is_capped_by_max_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [{"id": "tt0113277", "primaryTitle": "Heat", "startYear": 1995}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = server.uri();
    let (results, elapsed) = tokio::task::spawn_blocking(move || {
        let client = ImdbClient::new(ClientSettings {
            base_url,
            api_key: Some("test-key".into()),
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::ZERO,
                max_delay: Duration::from_millis(300),
            },
            ..ClientSettings::default()
        })
        .unwrap();
        let started = Instant::now();
        let results = client.search_titles("Heat", 5);
        (results, started.elapsed())
    })
    .await
    .unwrap();

    assert_eq!(results.unwrap().len(), 1);
    // the header was honoured (backoff alone would be zero) but capped well below 30s
    assert!(elapsed >= Duration::from_millis(300), "waited {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10), "waited {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exhausted_retries_degrade_to_empty_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let (direct, degraded) = blocking(server.uri(), |c| {
        (c.search_titles("Heat", 5), c.lookup("Heat", 5))
    })
    .await;

    assert!(matches!(direct, Err(LookupError::Network { attempts: 3, .. })));
    assert!(degraded.unwrap().is_empty());
    // both calls spent the full budget
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_credentials_are_fatal_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = blocking(server.uri(), |c| c.lookup("Heat", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Auth { status: 401 }));
    assert!(err.is_fatal());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = blocking(server.uri(), |c| c.search_titles("Heat", 5)).await;
    assert!(matches!(result, Err(LookupError::Status { status: 404, .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_payload_yields_no_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let results = blocking(server.uri(), |c| c.lookup("Heat", 5)).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_episode_lookup_picks_matching_episode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .and(query_param("query", "Game of Thrones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [
                {"id": "tt0944947", "type": "tvSeries", "primaryTitle": "Game of Thrones", "startYear": 2011},
                {"id": "tt9999999", "type": "movie", "primaryTitle": "Game of Thrones: The Movie"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/titles/tt0944947/episodes"))
        .and(query_param("season", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "episodes": [
                {"id": "tt1480055", "title": "Winter Is Coming", "season": "1", "episodeNumber": 1},
                {"id": "tt1668746", "title": "The Kingsroad", "season": "1", "episodeNumber": 2}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results: Vec<MatchResult> = blocking(server.uri(), |c| c.lookup_episode("Game of Thrones", 1, 2, 5))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "tt1668746");
    assert_eq!(results[0].title, "Game of Thrones");
    assert_eq!(results[0].year, Some(2011));
    assert_eq!(results[0].kind, MediaKind::Episode);
    assert_eq!(results[0].episode_title.as_deref(), Some("The Kingsroad"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_episode_lookup_falls_back_to_title_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [{"id": "tt0475784", "type": "tvSeries", "primaryTitle": "Westworld"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/titles/tt0475784/episodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"episodes": []})))
        .mount(&server)
        .await;

    let results = blocking(server.uri(), |c| c.lookup_episode("Westworld", 9, 1, 5))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, MediaKind::Series);
    assert!(results[0].episode_title.is_none());
}
