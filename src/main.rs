use paperbtc::datasource::{BinanceSource, SyntheticSource};
use paperbtc::feed::TickerFeed;
use paperbtc::{api, config::Config, config::FeedMode, db::init_db, PriceSource, Repository, Symbol};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));

    let price_source: Arc<dyn PriceSource> = match config.feed_mode {
        FeedMode::Live => Arc::new(BinanceSource::new(config.binance_api_url.clone())),
        FeedMode::Synthetic => Arc::new(SyntheticSource::default()),
    };

    // Start the tick feed for the portfolio trading pair.
    let feed = TickerFeed::new();
    match config.feed_mode {
        FeedMode::Live => feed
            .clone()
            .spawn_live(config.binance_ws_url.clone(), Symbol::btcusdt()),
        FeedMode::Synthetic => feed.clone().spawn_synthetic(42, Symbol::btcusdt(), 60_000.0),
    }

    // Create router
    let state = api::AppState::new(repo, config, price_source, feed);
    let app = api::create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
