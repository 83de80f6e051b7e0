use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{Decimal, Side, Symbol, TimeMs, Trade};
use crate::error::AppError;

use super::{clamp_limit, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub cash: String,
    pub btc_qty: String,
    pub btc_price: String,
    pub total_value: String,
    pub updated_at: i64,
}

pub async fn get_portfolio(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let portfolio = state
        .repo
        .get_portfolio(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))?;

    let price = state.resolve_price(&Symbol::btcusdt()).await?;
    let total = portfolio.value_at(price);

    Ok(Json(PortfolioResponse {
        cash: portfolio.cash.to_canonical_string(),
        btc_qty: portfolio.btc_qty.to_canonical_string(),
        btc_price: price.to_canonical_string(),
        total_value: total.round_dp(2).to_canonical_string(),
        updated_at: portfolio.updated_at.as_i64(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceTradeRequest {
    pub side: String,
    /// BTC quantity as a decimal string.
    pub qty: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    pub id: String,
    pub symbol: String,
    pub side: String,
    pub qty: String,
    pub price: String,
    pub notional: String,
    pub executed_at: i64,
}

impl From<&Trade> for TradeDto {
    fn from(trade: &Trade) -> Self {
        TradeDto {
            id: trade.id.to_string(),
            symbol: trade.symbol.as_str().to_string(),
            side: trade.side.to_string(),
            qty: trade.qty.to_canonical_string(),
            price: trade.price.to_canonical_string(),
            notional: trade.notional().to_canonical_string(),
            executed_at: trade.executed_at.as_i64(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceTradeResponse {
    pub trade: TradeDto,
    pub cash: String,
    pub btc_qty: String,
}

/// Execute a market buy/sell at the latest known price.
pub async fn place_trade(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PlaceTradeRequest>,
) -> Result<Json<PlaceTradeResponse>, AppError> {
    let side = Side::from_str(&req.side)
        .map_err(|_| AppError::BadRequest("side must be buy or sell".to_string()))?;

    let qty = Decimal::from_str_canonical(req.qty.trim())
        .map_err(|_| AppError::BadRequest("qty must be a decimal number".to_string()))?;
    if !qty.is_positive() {
        return Err(AppError::Unprocessable("qty must be positive".to_string()));
    }

    let mut portfolio = state
        .repo
        .get_portfolio(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))?;

    let symbol = Symbol::btcusdt();
    let price = state.resolve_price(&symbol).await?;
    let notional = qty * price;

    match side {
        Side::Buy => {
            if portfolio.cash < notional {
                return Err(AppError::Unprocessable(format!(
                    "insufficient cash: need {}, have {}",
                    notional.round_dp(2),
                    portfolio.cash.round_dp(2)
                )));
            }
            portfolio.cash = portfolio.cash - notional;
            portfolio.btc_qty = portfolio.btc_qty + qty;
        }
        Side::Sell => {
            if portfolio.btc_qty < qty {
                return Err(AppError::Unprocessable(format!(
                    "insufficient holdings: need {}, have {}",
                    qty, portfolio.btc_qty
                )));
            }
            portfolio.cash = portfolio.cash + notional;
            portfolio.btc_qty = portfolio.btc_qty - qty;
        }
    }

    let now = TimeMs::now();
    portfolio.updated_at = now;

    let trade = Trade {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        symbol,
        side,
        qty,
        price,
        executed_at: now,
    };

    state.repo.execute_trade(&trade, &portfolio).await?;

    tracing::info!(
        user = %auth.username,
        side = %side,
        qty = %qty,
        price = %price,
        "executed trade"
    );

    Ok(Json(PlaceTradeResponse {
        trade: TradeDto::from(&trade),
        cash: portfolio.cash.to_canonical_string(),
        btc_qty: portfolio.btc_qty.to_canonical_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListTradesQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub trades: Vec<TradeDto>,
}

pub async fn list_trades(
    auth: AuthUser,
    Query(params): Query<ListTradesQuery>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let limit = clamp_limit(params.limit, 50, 500);
    let trades = state.repo.list_trades(&auth.user_id, limit as i64).await?;

    Ok(Json(TradesResponse {
        trades: trades.iter().map(TradeDto::from).collect(),
    }))
}
