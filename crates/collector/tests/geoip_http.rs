//! ip-api 호환 HTTP 조회기 테스트 (wiremock)

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use netsentry_collector::enrich::{GeoIpProvider, GeoResolution};
use netsentry_collector::{ErrorHandler, GeoIpService, IpApiProvider};
use netsentry_core::config::GeoIpConfig;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIELDS: &str = "status,country,countryCode,region,city,isp";

fn config(server: &MockServer) -> GeoIpConfig {
    GeoIpConfig {
        base_url: server.uri(),
        timeout_ms: 500,
        ..GeoIpConfig::default()
    }
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn successful_lookup_returns_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .and(query_param("fields", FIELDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "country": "United States",
            "countryCode": "US",
            "region": "VA",
            "city": "Ashburn",
            "isp": "Google LLC"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(&config(&server)).unwrap();
    let record = provider.lookup(ip("8.8.8.8")).await.unwrap();
    assert_eq!(record.country, "United States");
    assert_eq!(record.country_code, "US");
    assert_eq!(record.city, "Ashburn");
    assert_eq!(record.isp, "Google LLC");
}

#[tokio::test]
async fn fail_status_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "reserved range"
        })))
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(&config(&server)).unwrap();
    let err = provider.lookup(ip("203.0.113.5")).await.unwrap_err();
    assert!(err.to_string().contains("'fail'"));
}

#[tokio::test]
async fn server_error_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(&config(&server)).unwrap();
    let err = provider.lookup(ip("203.0.113.5")).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn malformed_body_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(&config(&server)).unwrap();
    let err = provider.lookup(ip("203.0.113.5")).await.unwrap_err();
    assert!(err.to_string().contains("malformed"));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "country": "Germany"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = IpApiProvider::new(&config(&server)).unwrap();
    assert!(provider.lookup(ip("203.0.113.5")).await.is_err());
}

#[tokio::test]
async fn service_caches_successful_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/198.51.100.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "country": "Japan"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server);
    let service = GeoIpService::with_config(
        IpApiProvider::new(&config).unwrap(),
        Arc::new(ErrorHandler::new()),
        &config,
    );

    assert_eq!(service.country("198.51.100.9").await, "Japan");
    assert_eq!(service.country("198.51.100.9").await, "Japan");
    assert_eq!(service.cache_len(), 1);
}

#[tokio::test]
async fn service_reports_unknown_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config(&server);
    let handler = Arc::new(ErrorHandler::new());
    let service = GeoIpService::with_config(
        IpApiProvider::new(&config).unwrap(),
        Arc::clone(&handler),
        &config,
    );

    assert_eq!(service.resolve("203.0.113.5").await, GeoResolution::Unresolved);
    assert_eq!(service.country("203.0.113.5").await, "Unknown");
    assert_eq!(service.cache_len(), 0);
    assert!(handler.error_rate("geoip_lookup") > 0.0);
}
