//! YahooClient against a mocked chart endpoint.

use chrono::NaiveDate;
use std::time::Duration;
use stockwatch::{Config, Interval, MarketDataClient, WatchlistError, YahooClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHART_BODY: &str = r#"{
    "chart": {
        "result": [{
            "meta": {"symbol": "MSFT", "exchangeTimezoneName": "America/New_York"},
            "timestamp": [1709649000, 1709735400],
            "indicators": {"quote": [{
                "open":   [400.0, 402.0],
                "high":   [405.0, 406.0],
                "low":    [399.0, 401.0],
                "close":  [402.5, 404.0],
                "volume": [1200000, 1300000]
            }]}
        }],
        "error": null
    }
}"#;

fn client_for(server: &MockServer) -> YahooClient {
    let config = Config::new()
        .with_base_url(&server.uri())
        .with_request_interval(Duration::from_millis(0));
    YahooClient::new(&config).unwrap()
}

#[tokio::test]
async fn fetches_daily_bars() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/MSFT"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHART_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let points = client_for(&server).fetch("MSFT", 7, Interval::Daily).await.unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    assert_eq!(points[1].close, 404.0);
    assert_eq!(points[1].volume, Some(1_300_000));
}

#[tokio::test]
async fn unknown_symbol_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        ))
        .mount(&server)
        .await;

    let points = client_for(&server).fetch("NOPE", 7, Interval::Daily).await.unwrap();
    assert!(points.is_empty());
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch("MSFT", 7, Interval::Daily).await;
    assert!(matches!(result, Err(WatchlistError::MarketDataError(_))));
}

#[tokio::test]
async fn slow_response_hits_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(CHART_BODY)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = Config::new()
        .with_base_url(&server.uri())
        .with_request_interval(Duration::from_millis(0))
        .with_fetch_timeout(Duration::from_millis(100));
    let client = YahooClient::new(&config).unwrap();

    let result = client.fetch("MSFT", 7, Interval::Daily).await;
    assert!(matches!(result, Err(WatchlistError::RequestError(_))));
}
