//! HTTP Adapter Tests - BackendClient + HttpBackend against wiremock
//!
//! Exercises the real reqwest stack against a local mock server:
//! token authentication, status/transport error mapping, list
//! envelopes and the feed authorization lookup.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voluguard::adapters::api::{BackendClient, BackendClientConfig, HttpBackend};
use voluguard::adapters::metrics::MetricsRegistry;
use voluguard::domain::{AccessToken, JournalEntry, Mood, NewJournalEntry, TradeFilter};
use voluguard::error::ApiError;
use voluguard::ports::{TokenCheck, TradingBackend};

const TOKEN: &str = "eyJ0eXAiOiJKV1Q.test";

fn config(base_url: &str) -> BackendClientConfig {
    BackendClientConfig {
        base_url: base_url.to_string(),
        probe_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_millis(500),
        heavy_timeout: Duration::from_secs(2),
        ..BackendClientConfig::default()
    }
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(BackendClient::new(config(&server.uri())).unwrap())
}

fn token() -> AccessToken {
    AccessToken::new(TOKEN).unwrap()
}

#[tokio::test]
async fn test_token_sent_as_query_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/option-seller-dashboard"))
        .and(query_param("access_token", TOKEN))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nifty_spot": "24,350.5",
            "india_vix": 13.2,
            "pcr": "N/A",
            "regime_note": "calm"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = backend(&server)
        .option_seller_dashboard(&token())
        .await
        .unwrap();
    assert_eq!(snapshot.nifty_spot, Some(24_350.5));
    assert_eq!(snapshot.india_vix, Some(13.2));
    assert_eq!(snapshot.pcr, None);
    assert_eq!(snapshot.extra.get("regime_note"), Some(&json!("calm")));
}

#[tokio::test]
async fn test_probe_maps_status_to_token_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expiries"))
        .and(query_param("access_token", "good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["2025-08-28"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/expiries"))
        .and(query_param("access_token", "stale"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let good = AccessToken::new("good").unwrap();
    let stale = AccessToken::new("stale").unwrap();
    assert_eq!(backend.validate_token(&good).await, TokenCheck::Valid);
    assert_eq!(backend.validate_token(&stale).await, TokenCheck::Rejected(401));
}

#[tokio::test]
async fn test_probe_unreachable_backend() {
    let backend = HttpBackend::new(BackendClient::new(config("http://127.0.0.1:1")).unwrap());
    assert!(matches!(
        backend.validate_token(&token()).await,
        TokenCheck::Unreachable(_)
    ));
}

#[tokio::test]
async fn test_error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/predict/volatility"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model offline"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .predict_volatility(&token())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.to_string(), "API Error: 503 - model offline");
}

#[tokio::test]
async fn test_timeout_is_a_network_error_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/full-chain-table"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = backend(&server).full_chain_table(&token()).await.unwrap_err();
    assert_eq!(err.kind(), "network");
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/suggest/strategy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).suggest_strategy(&token()).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { ref endpoint, .. } if endpoint == "/suggest/strategy"));
}

#[tokio::test]
async fn test_chain_accepts_wrapped_and_bare_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/full-chain-table"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"Strike": 24300, "Call IV": 12.1, "Put IV": 13.4, "IV Skew": 1.3},
                {"Strike": 24350, "Call IV": "11.9", "Put IV": 12.8, "IV Skew": 0.9}
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/full-chain-table"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"Strike": 24400, "IV Skew": -0.2}
        ])))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let wrapped = backend.full_chain_table(&token()).await.unwrap();
    assert_eq!(wrapped.len(), 2);
    assert_eq!(wrapped[1].call_iv, Some(11.9));

    let bare = backend.full_chain_table(&token()).await.unwrap();
    assert_eq!(bare[0].strike, Some(24_400.0));
    assert_eq!(bare[0].call_iv, None);
}

#[tokio::test]
async fn test_trade_filter_becomes_status_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch/trades"))
        .and(query_param("status", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trades": [{
                "strategy": "Iron Fly",
                "instrument_token": "NSE_FO|NIFTY",
                "entry_price": "22000",
                "quantity": 75,
                "status": "open",
                "id": 7
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let trades = backend(&server)
        .fetch_trades(&token(), TradeFilter::Open)
        .await
        .unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].entry_price, 22_000.0);
    assert_eq!(trades[0].extra.get("id"), Some(&json!(7)));
}

#[tokio::test]
async fn test_journal_round_trip_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log/journal"))
        .and(body_partial_json(json!({
            "title": "Expiry day",
            "mood": "Positive",
            "tags": "expiry,discipline"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "saved"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fetch/journals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "Expiry day", "content": "Held", "mood": "Positive", "tags": "expiry, discipline"}
        ])))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let entry = NewJournalEntry {
        title: "Expiry day".into(),
        content: "Held the fly into close".into(),
        mood: Mood::Positive,
        tags: "expiry,discipline".into(),
    };
    backend.log_journal(&token(), &entry).await.unwrap();

    let journals: Vec<JournalEntry> = backend.fetch_journals(&token()).await.unwrap();
    assert_eq!(journals[0].tag_list(), vec!["expiry", "discipline"]);
}

#[tokio::test]
async fn test_feed_authorization_finds_socket_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authorize-market-feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"authorized_redirect_uri": "wss://feed.example.test/v3?code=abc"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/authorize-market-feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let auth = backend.authorize_market_feed(&token()).await.unwrap();
    assert_eq!(auth.socket_url, "wss://feed.example.test/v3?code=abc");

    let err = backend.authorize_market_feed(&token()).await.unwrap_err();
    assert_eq!(err.kind(), "decode");
}

#[tokio::test]
async fn test_requests_are_counted_by_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calculate/regime"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let metrics = MetricsRegistry::new().unwrap();
    let client = BackendClient::new(config(&server.uri()))
        .unwrap()
        .with_metrics(metrics.clone());
    let backend = HttpBackend::new(client);

    assert!(backend.calculate_regime(&token()).await.is_err());
    assert_eq!(
        metrics
            .api_requests
            .with_label_values(&["/calculate/regime", "http"])
            .get(),
        1
    );
}
