//! Integration tests for `FeedFetcher` and the aggregation pipeline.
//!
//! Each test stands up a local `wiremock` server that plays both the
//! retailer feed and the relay endpoints, so no real network traffic is made.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fuelmap_core::FeedSource;
use fuelmap_feeds::{
    aggregate, AggregationOptions, DeliveryStrategy, FeedError, FeedFetcher, FetchFeed,
    NoopObserver, SourceStatus,
};

fn test_fetcher(strategies: Vec<DeliveryStrategy>) -> FeedFetcher {
    FeedFetcher::new(5, "fuelmap-test/0.1", strategies, 0, 0)
        .expect("failed to build test FeedFetcher")
}

fn relay(server: &MockServer, route: &str) -> DeliveryStrategy {
    DeliveryStrategy::Relay {
        prefix: format!("{}/{route}?url=", server.uri()),
    }
}

fn one_station_feed(site_id: &str) -> serde_json::Value {
    json!({
        "last_updated": "01/06/2025 07:30:00",
        "stations": [{
            "site_id": site_id,
            "brand": "JET",
            "address": "1 High Street",
            "postcode": "AB1 2CD",
            "location": {"latitude": 52.4862, "longitude": -1.8904},
            "prices": {"E10": 137.9, "B7": "145.9"}
        }]
    })
}

// ---------------------------------------------------------------------------
// Strategy fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_success_sends_no_cache_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_station_feed("d1")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(vec![DeliveryStrategy::Direct]);
    let value = fetcher
        .fetch_feed(&format!("{}/feed.json", server.uri()))
        .await
        .expect("direct fetch should succeed");

    assert_eq!(value["stations"][0]["site_id"], "d1");
}

#[tokio::test]
async fn falls_back_to_relay_when_direct_returns_server_error() {
    let server = MockServer::start().await;
    let feed_url = format!("{}/feed.json", server.uri());

    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relay-a"))
        .and(query_param("url", feed_url.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_station_feed("r1")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(vec![DeliveryStrategy::Direct, relay(&server, "relay-a")]);
    let value = fetcher.fetch_feed(&feed_url).await.expect("relay should succeed");

    assert_eq!(value["stations"][0]["site_id"], "r1");
}

#[tokio::test]
async fn skips_relay_returning_invalid_json() {
    let server = MockServer::start().await;
    let feed_url = format!("{}/feed.json", server.uri());

    Mock::given(method("GET"))
        .and(path("/relay-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relay-b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_station_feed("b1")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(vec![relay(&server, "relay-a"), relay(&server, "relay-b")]);
    let value = fetcher.fetch_feed(&feed_url).await.expect("second relay should succeed");

    assert_eq!(value["stations"][0]["site_id"], "b1");
}

#[tokio::test]
async fn exhausting_every_strategy_is_fetch_failure() {
    let server = MockServer::start().await;
    let feed_url = format!("{}/feed.json", server.uri());

    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relay-a"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let fetcher = test_fetcher(vec![DeliveryStrategy::Direct, relay(&server, "relay-a")]);
    let err = fetcher.fetch_feed(&feed_url).await.unwrap_err();

    match err {
        FeedError::FetchFailure { url } => assert_eq!(url, feed_url),
        other => panic!("expected FetchFailure, got: {other:?}"),
    }
}

#[tokio::test]
async fn retries_rate_limited_strategy_when_enabled() {
    let server = MockServer::start().await;
    let feed_url = format!("{}/feed.json", server.uri());

    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_station_feed("retry")))
        .mount(&server)
        .await;

    let fetcher = FeedFetcher::new(5, "fuelmap-test/0.1", vec![DeliveryStrategy::Direct], 2, 1)
        .expect("failed to build test FeedFetcher");
    let value = fetcher.fetch_feed(&feed_url).await.expect("retry should succeed");

    assert_eq!(value["stations"][0]["site_id"], "retry");
}

// ---------------------------------------------------------------------------
// Aggregation over real HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aggregate_isolates_failing_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jet.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_station_feed("jet-1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tesco.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "last_updated": "01/06/2025 07:00:00",
            "stations": [
                {"site_id": "t-1", "brand": "TESCO", "location": {"latitude": "51.45", "longitude": "-2.58"}},
                {"site_id": "t-0", "brand": "TESCO", "location": {"latitude": 0, "longitude": 0}}
            ]
        })))
        .mount(&server)
        .await;

    let sources = vec![
        FeedSource::new("JET", &format!("{}/jet.json", server.uri())),
        FeedSource::new("Broken", &format!("{}/broken.json", server.uri())),
        FeedSource::new("Tesco", &format!("{}/tesco.json", server.uri())),
    ];
    let fetcher = test_fetcher(vec![DeliveryStrategy::Direct]);
    let options = AggregationOptions {
        max_concurrent_sources: 3,
        inter_request_delay: std::time::Duration::ZERO,
    };

    let report = aggregate(&sources, &fetcher, options, &NoopObserver).await;

    let ids: Vec<String> = report.stations.iter().filter_map(|s| s.site_id()).collect();
    assert_eq!(ids, ["jet-1", "t-1"]);
    assert_eq!(report.stations[0].source_name, "JET");
    assert_eq!(report.stations[1].display_brand, "TESCO");
    assert!(matches!(report.outcomes[1].status, SourceStatus::Failed { .. }));
    assert_eq!(
        report.outcomes[2].status,
        SourceStatus::Succeeded {
            stations: 1,
            dropped: 1
        }
    );
}
