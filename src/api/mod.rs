pub mod agents;
pub mod auth;
pub mod chat;
pub mod health;
pub mod market;
pub mod news;
pub mod notes;
pub mod portfolio;
pub mod reports;
pub mod search;
pub mod stream;
pub mod watchlist;

use crate::auth::JwtHandler;
use crate::config::Config;
use crate::datasource::PriceSource;
use crate::db::Repository;
use crate::domain::{Decimal, Symbol};
use crate::error::AppError;
use crate::feed::TickerFeed;
use crate::search::SearchService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub price_source: Arc<dyn PriceSource>,
    pub feed: Arc<TickerFeed>,
    pub search: SearchService,
    pub jwt: JwtHandler,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        price_source: Arc<dyn PriceSource>,
        feed: Arc<TickerFeed>,
    ) -> Self {
        let client = reqwest::Client::new();
        let search = SearchService::new(client, config.search_api_url.clone());
        let jwt = JwtHandler::new(config.jwt_secret.clone(), config.token_ttl_hours);

        Self {
            repo,
            config,
            price_source,
            feed,
            search,
            jwt,
        }
    }

    /// Latest price for a symbol: live feed first, REST ticker as fallback.
    pub async fn resolve_price(&self, symbol: &Symbol) -> Result<Decimal, AppError> {
        if let Some(tick) = self.feed.latest(symbol) {
            if let Some(price) = Decimal::from_f64(tick.price) {
                return Ok(price);
            }
        }

        let tick = self.price_source.fetch_ticker(symbol).await.map_err(|e| {
            AppError::Unprocessable(format!("No price available for {}: {}", symbol, e))
        })?;

        Decimal::from_f64(tick.price)
            .ok_or_else(|| AppError::Unprocessable(format!("No price available for {}", symbol)))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/portfolio", get(portfolio::get_portfolio))
        .route(
            "/v1/trades",
            get(portfolio::list_trades).post(portfolio::place_trade),
        )
        .route("/v1/agents", get(agents::list_agents).post(agents::create_agent))
        .route(
            "/v1/agents/:id",
            get(agents::get_agent)
                .put(agents::update_agent)
                .delete(agents::delete_agent),
        )
        .route(
            "/v1/agents/:id/reports",
            get(reports::list_reports).post(reports::generate_report),
        )
        .route("/v1/reports/:id", get(reports::get_report))
        .route("/v1/chat", post(chat::send_message))
        .route("/v1/chat/history", get(chat::history))
        .route(
            "/v1/watchlist",
            get(watchlist::list_items).post(watchlist::add_item),
        )
        .route("/v1/watchlist/:id", axum::routing::delete(watchlist::remove_item))
        .route("/v1/watchlist/alerts", get(watchlist::check_alerts))
        .route("/v1/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/v1/notes/:id",
            axum::routing::put(notes::update_note).delete(notes::delete_note),
        )
        .route("/v1/search", get(search::search))
        .route("/v1/news", get(news::list_news).post(news::submit_article))
        .route("/v1/news/sentiment", get(news::sentiment))
        .route("/v1/indicators", get(market::indicators))
        .route("/v1/chart", get(market::chart))
        .route("/v1/patterns", get(market::patterns))
        .route("/v1/stream/ticks", get(stream::ticks))
        .layer(cors)
        .with_state(state)
}

/// Parse and validate a symbol query parameter, defaulting to BTCUSDT.
pub(crate) fn parse_symbol(raw: Option<&str>) -> Result<Symbol, AppError> {
    let symbol = match raw {
        Some(s) if !s.trim().is_empty() => Symbol::new(s),
        _ => Symbol::btcusdt(),
    };
    if !symbol.is_valid() {
        return Err(AppError::BadRequest(format!(
            "Invalid symbol: {}",
            symbol.as_str()
        )));
    }
    Ok(symbol)
}

/// Clamp a user-supplied limit into [1, max], with a default.
pub(crate) fn clamp_limit(raw: Option<u32>, default: u32, max: u32) -> u32 {
    raw.unwrap_or(default).clamp(1, max)
}
