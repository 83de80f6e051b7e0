use axum::http::StatusCode;
use paperbtc::api;
use paperbtc::config::{Config, FeedMode};
use paperbtc::datasource::SyntheticSource;
use paperbtc::db::init_db;
use paperbtc::domain::Decimal;
use paperbtc::feed::TickerFeed;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(paperbtc::Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        binance_api_url: "http://example.invalid".to_string(),
        binance_ws_url: "ws://example.invalid".to_string(),
        jwt_secret: "test-secret-key-12345".to_string(),
        token_ttl_hours: 24,
        starting_cash: Decimal::from_str_canonical("10000").unwrap(),
        feed_mode: FeedMode::Synthetic,
        search_api_url: None,
    };

    let state = api::AppState::new(
        repo,
        config,
        Arc::new(SyntheticSource::new(7)),
        TickerFeed::new(),
    );
    let app = api::create_router(state);

    TestApp {
        app,
        _temp: temp_dir,
    }
}

async fn get(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = builder.body(axum::body::Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn register(app: &axum::Router, username: &str) -> String {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({"username": username, "password": "hunter2000"}).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_indicators_full_history() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "quant").await;

    let (status, json) = get(
        test_app.app.clone(),
        "/v1/indicators?symbol=BTCUSDT&interval=1h&limit=200",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["symbol"], "BTCUSDT");
    assert_eq!(json["interval"], "1h");
    assert_eq!(json["candleCount"], 200);
    assert!(json["price"].as_f64().unwrap() > 0.0);
    assert!(json["sma20"].is_number());
    assert!(json["sma50"].is_number());
    assert!(json["ema12"].is_number());
    assert!(json["ema26"].is_number());

    let rsi = json["rsi14"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&rsi));

    assert!(json["macd"]["histogram"].is_number());
    let upper = json["bollinger"]["upper"].as_f64().unwrap();
    let lower = json["bollinger"]["lower"].as_f64().unwrap();
    assert!(upper >= lower);

    let k = json["stochastic"]["k"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&k));
}

#[tokio::test]
async fn test_indicators_short_history_omits_fields() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "newbie").await;

    let (status, json) = get(
        test_app.app.clone(),
        "/v1/indicators?limit=10",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["candleCount"], 10);
    // 10 candles cannot feed a 50-period SMA or MACD signal.
    assert!(json.get("sma50").is_none());
    assert!(json.get("macd").is_none());
    assert!(json.get("rsi14").is_none());
    // But a 20-period window is short too.
    assert!(json.get("sma20").is_none());
}

#[tokio::test]
async fn test_indicators_validation() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "strict").await;

    let (status, _) = get(
        test_app.app.clone(),
        "/v1/indicators?interval=3w",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(
        test_app.app.clone(),
        "/v1/indicators?symbol=BTC%2FUSDT",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chart_returns_requested_candles() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "charter").await;

    let (status, json) = get(
        test_app.app.clone(),
        "/v1/chart?symbol=btcusdt&interval=5m&limit=50",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["symbol"], "BTCUSDT");
    let candles = json["candles"].as_array().unwrap();
    assert_eq!(candles.len(), 50);

    let first = &candles[0];
    for field in ["openTime", "open", "high", "low", "close", "volume"] {
        assert!(first[field].is_number(), "missing {}", field);
    }

    // Oldest first, fixed interval spacing.
    let t0 = candles[0]["openTime"].as_i64().unwrap();
    let t1 = candles[1]["openTime"].as_i64().unwrap();
    assert_eq!(t1 - t0, 300_000);
}

#[tokio::test]
async fn test_patterns_detected_and_recorded() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "reader").await;

    let (status, json) = get(
        test_app.app.clone(),
        "/v1/patterns?symbol=BTCUSDT&interval=1h&limit=300",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let hits = json["hits"].as_array().unwrap();
    // A 300-candle random walk reliably produces at least one pattern.
    assert!(!hits.is_empty());
    assert_eq!(json["recorded"].as_u64().unwrap() as usize, hits.len());

    // Re-scanning the same candles records nothing new.
    let (_, json2) = get(
        test_app.app.clone(),
        "/v1/patterns?symbol=BTCUSDT&interval=1h&limit=300",
        Some(&token),
    )
    .await;
    assert_eq!(json2["recorded"], 0);
    assert_eq!(json2["hits"].as_array().unwrap().len(), hits.len());
}

#[tokio::test]
async fn test_market_routes_require_auth() {
    let test_app = setup_test_app().await;

    for uri in ["/v1/indicators", "/v1/chart", "/v1/patterns"] {
        let (status, _) = get(test_app.app.clone(), uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri: {}", uri);
    }
}
