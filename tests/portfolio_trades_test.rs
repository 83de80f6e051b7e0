use axum::http::StatusCode;
use paperbtc::api;
use paperbtc::config::{Config, FeedMode};
use paperbtc::datasource::SyntheticSource;
use paperbtc::db::init_db;
use paperbtc::domain::{Decimal, Symbol};
use paperbtc::feed::{PriceTick, TickerFeed};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    feed: Arc<TickerFeed>,
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

    let feed = TickerFeed::new();
    // Pin the executed price so balance assertions are exact.
    feed.publish(PriceTick {
        symbol: Symbol::btcusdt().as_str().to_string(),
        time_ms: 1_700_000_000_000,
        price: 50_000.0,
    });

    let state = api::AppState::new(
        repo,
        config,
        Arc::new(SyntheticSource::new(7)),
        feed.clone(),
    );
    let app = api::create_router(state);

    TestApp {
        app,
        feed,
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn register(app: &axum::Router, username: &str) -> String {
    let (status, json) = request(
        app.clone(),
        "POST",
        "/v1/auth/register",
        None,
        Some(serde_json::json!({"username": username, "password": "hunter2000"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", json);
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_buy_updates_balances() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "buyer").await;

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "0.1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "trade failed: {}", json);
    assert_eq!(json["trade"]["side"], "buy");
    assert_eq!(json["trade"]["price"], "50000");
    assert_eq!(json["trade"]["notional"], "5000");
    assert_eq!(json["cash"], "5000");
    assert_eq!(json["btcQty"], "0.1");
}

#[tokio::test]
async fn test_sell_after_buy() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "seller").await;

    request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "0.1"})),
    )
    .await;

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "sell", "qty": "0.04"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cash"], "7000");
    assert_eq!(json["btcQty"], "0.06");
}

#[tokio::test]
async fn test_insufficient_cash_rejected() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "pauper").await;

    // 1 BTC at 50000 against 10000 starting cash.
    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "1"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("insufficient cash"));
}

#[tokio::test]
async fn test_insufficient_holdings_rejected() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "shortless").await;

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "sell", "qty": "0.5"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("insufficient holdings"));
}

#[tokio::test]
async fn test_invalid_trade_params() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "fumbler").await;

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "hold", "qty": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "0"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "-0.1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_trade_history_most_recent_first() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "churner").await;

    for qty in ["0.01", "0.02", "0.03"] {
        let (status, _) = request(
            test_app.app.clone(),
            "POST",
            "/v1/trades",
            Some(&token),
            Some(serde_json::json!({"side": "buy", "qty": qty})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = request(
        test_app.app.clone(),
        "GET",
        "/v1/trades",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let trades = json["trades"].as_array().unwrap();
    assert_eq!(trades.len(), 3);

    let times: Vec<i64> = trades
        .iter()
        .map(|t| t["executedAt"].as_i64().unwrap())
        .collect();
    assert!(times.windows(2).all(|w| w[0] >= w[1]));

    let mut qtys: Vec<&str> = trades.iter().map(|t| t["qty"].as_str().unwrap()).collect();
    qtys.sort_unstable();
    assert_eq!(qtys, vec!["0.01", "0.02", "0.03"]);
}

#[tokio::test]
async fn test_portfolio_valuation_tracks_price() {
    let test_app = setup_test_app().await;
    let token = register(&test_app.app, "holder").await;

    request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token),
        Some(serde_json::json!({"side": "buy", "qty": "0.1"})),
    )
    .await;

    // Price doubles after the buy.
    test_app.feed.publish(PriceTick {
        symbol: Symbol::btcusdt().as_str().to_string(),
        time_ms: 1_700_000_100_000,
        price: 100_000.0,
    });

    let (status, json) = request(
        test_app.app.clone(),
        "GET",
        "/v1/portfolio",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cash"], "5000");
    assert_eq!(json["btcQty"], "0.1");
    assert_eq!(json["btcPrice"], "100000");
    assert_eq!(json["totalValue"], "15000");
}

#[tokio::test]
async fn test_trades_isolated_per_user() {
    let test_app = setup_test_app().await;
    let token_a = register(&test_app.app, "alice").await;
    let token_b = register(&test_app.app, "bob").await;

    request(
        test_app.app.clone(),
        "POST",
        "/v1/trades",
        Some(&token_a),
        Some(serde_json::json!({"side": "buy", "qty": "0.1"})),
    )
    .await;

    let (_, json) = request(
        test_app.app.clone(),
        "GET",
        "/v1/trades",
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(json["trades"].as_array().unwrap().len(), 0);
}
