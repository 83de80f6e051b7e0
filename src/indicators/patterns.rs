//! Candlestick pattern detection over candle windows.

use crate::domain::{Candle, TimeMs};
use serde::Serialize;

/// Recognized candlestick patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    Hammer,
    BullishEngulfing,
    BearishEngulfing,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl CandlePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandlePattern::Doji => "doji",
            CandlePattern::Hammer => "hammer",
            CandlePattern::BullishEngulfing => "bullish_engulfing",
            CandlePattern::BearishEngulfing => "bearish_engulfing",
            CandlePattern::ThreeWhiteSoldiers => "three_white_soldiers",
            CandlePattern::ThreeBlackCrows => "three_black_crows",
        }
    }
}

/// A pattern found at a specific candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternHit {
    pub open_time: TimeMs,
    pub pattern: CandlePattern,
}

/// Scan a candle series and report every pattern hit, oldest first.
pub fn detect_patterns(candles: &[Candle]) -> Vec<PatternHit> {
    let mut hits = Vec::new();

    for i in 0..candles.len() {
        for pattern in detect_at(candles, i) {
            hits.push(PatternHit {
                open_time: candles[i].open_time,
                pattern,
            });
        }
    }

    hits
}

/// Patterns completing at index `i`.
fn detect_at(candles: &[Candle], i: usize) -> Vec<CandlePattern> {
    let mut found = Vec::new();
    let c = &candles[i];

    if is_doji(c) {
        found.push(CandlePattern::Doji);
    }
    if is_hammer(c) {
        found.push(CandlePattern::Hammer);
    }

    if i >= 1 {
        let prev = &candles[i - 1];
        if prev.is_bearish() && c.is_bullish() && c.open <= prev.close && c.close >= prev.open {
            found.push(CandlePattern::BullishEngulfing);
        }
        if prev.is_bullish() && c.is_bearish() && c.open >= prev.close && c.close <= prev.open {
            found.push(CandlePattern::BearishEngulfing);
        }
    }

    if i >= 2 {
        let c1 = &candles[i - 2];
        let c2 = &candles[i - 1];

        if c1.is_bullish()
            && c2.is_bullish()
            && c.is_bullish()
            && c2.close > c1.close
            && c.close > c2.close
        {
            found.push(CandlePattern::ThreeWhiteSoldiers);
        }

        if c1.is_bearish()
            && c2.is_bearish()
            && c.is_bearish()
            && c2.close < c1.close
            && c.close < c2.close
        {
            found.push(CandlePattern::ThreeBlackCrows);
        }
    }

    found
}

/// Body within 10% of the full range.
fn is_doji(c: &Candle) -> bool {
    let range = c.range();
    range > f64::EPSILON && c.body() <= range * 0.1
}

/// Long lower shadow, small upper shadow.
fn is_hammer(c: &Candle) -> bool {
    let body = c.body();
    body > f64::EPSILON && c.lower_shadow() >= body * 2.0 && c.upper_shadow() <= body
}
