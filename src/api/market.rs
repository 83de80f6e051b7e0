use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::AuthUser;
use crate::domain::{Candle, Interval, TimeMs};
use crate::db::repo::PatternHitRow;
use crate::error::AppError;
use crate::indicators::{
    bollinger, detect_patterns, ema, macd, rsi, sma, stochastic, PatternHit,
};

use super::{clamp_limit, parse_symbol, AppState};

fn parse_interval(raw: Option<&str>) -> Result<Interval, AppError> {
    match raw {
        Some(s) if !s.trim().is_empty() => Interval::from_str(s.trim()).map_err(|_| {
            AppError::BadRequest(format!(
                "interval must be one of 1m, 5m, 15m, 1h, 4h, 1d; got {}",
                s
            ))
        }),
        _ => Ok(Interval::OneHour),
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdDto {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerDto {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StochasticDto {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorsResponse {
    pub symbol: String,
    pub interval: String,
    pub candle_count: usize,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema12: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema26: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi14: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stochastic: Option<StochasticDto>,
}

/// Compute the full indicator set over recent klines. Indicators the series
/// is too short for are omitted from the response.
pub async fn indicators(
    _auth: AuthUser,
    Query(params): Query<MarketQuery>,
    State(state): State<AppState>,
) -> Result<Json<IndicatorsResponse>, AppError> {
    let symbol = parse_symbol(params.symbol.as_deref())?;
    let interval = parse_interval(params.interval.as_deref())?;
    let limit = clamp_limit(params.limit, 100, 500);

    let candles = state
        .price_source
        .fetch_klines(&symbol, interval, limit)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch price history: {}", e)))?;

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let price = closes.last().copied().unwrap_or(0.0);

    Ok(Json(IndicatorsResponse {
        symbol: symbol.as_str().to_string(),
        interval: interval.as_str().to_string(),
        candle_count: candles.len(),
        price,
        sma20: sma(&closes, 20),
        sma50: sma(&closes, 50),
        ema12: ema(&closes, 12),
        ema26: ema(&closes, 26),
        rsi14: rsi(&closes, 14),
        macd: macd(&closes).map(|m| MacdDto {
            macd: m.macd,
            signal: m.signal,
            histogram: m.histogram,
        }),
        bollinger: bollinger(&closes, 20, 2.0).map(|b| BollingerDto {
            upper: b.upper,
            middle: b.middle,
            lower: b.lower,
        }),
        stochastic: stochastic(&highs, &lows, &closes, 14, 3).map(|s| StochasticDto {
            k: s.k,
            d: s.d,
        }),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub symbol: String,
    pub interval: String,
    pub candles: Vec<Candle>,
}

pub async fn chart(
    _auth: AuthUser,
    Query(params): Query<MarketQuery>,
    State(state): State<AppState>,
) -> Result<Json<ChartResponse>, AppError> {
    let symbol = parse_symbol(params.symbol.as_deref())?;
    let interval = parse_interval(params.interval.as_deref())?;
    let limit = clamp_limit(params.limit, 100, 1000);

    let candles = state
        .price_source
        .fetch_klines(&symbol, interval, limit)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch price history: {}", e)))?;

    Ok(Json(ChartResponse {
        symbol: symbol.as_str().to_string(),
        interval: interval.as_str().to_string(),
        candles,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternsResponse {
    pub symbol: String,
    pub interval: String,
    pub hits: Vec<PatternHit>,
    /// Newly recorded hits (previously seen candles are not re-counted).
    pub recorded: usize,
}

/// Detect candlestick patterns over recent klines and record the hits.
pub async fn patterns(
    _auth: AuthUser,
    Query(params): Query<MarketQuery>,
    State(state): State<AppState>,
) -> Result<Json<PatternsResponse>, AppError> {
    let symbol = parse_symbol(params.symbol.as_deref())?;
    let interval = parse_interval(params.interval.as_deref())?;
    let limit = clamp_limit(params.limit, 100, 500);

    let candles = state
        .price_source
        .fetch_klines(&symbol, interval, limit)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch price history: {}", e)))?;

    let hits = detect_patterns(&candles);

    let now = TimeMs::now();
    let rows: Vec<PatternHitRow> = hits
        .iter()
        .map(|h| PatternHitRow {
            symbol: symbol.clone(),
            interval,
            open_time: h.open_time,
            pattern: h.pattern.as_str().to_string(),
            detected_at: now,
        })
        .collect();
    let recorded = state.repo.insert_pattern_hits(&rows).await?;

    Ok(Json(PatternsResponse {
        symbol: symbol.as_str().to_string(),
        interval: interval.as_str().to_string(),
        hits,
        recorded,
    }))
}
