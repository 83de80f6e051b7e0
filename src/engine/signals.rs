//! Signal snapshot computed from a close-price series.

use crate::indicators::{bollinger, macd, rsi, sma};

/// Precomputed indicator values feeding the decision table.
///
/// Individual signals are `None` when the series is too short for their
/// period; the decision logic only counts signals that are present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalSnapshot {
    /// Latest close.
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    /// Position within the Bollinger bands: 0 at lower, 1 at upper.
    pub percent_b: Option<f64>,
}

pub const SMA_FAST_PERIOD: usize = 20;
pub const SMA_SLOW_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;

impl SignalSnapshot {
    /// Compute all signals from a close series, oldest first.
    pub fn from_closes(closes: &[f64]) -> Self {
        let price = closes.last().copied().unwrap_or(0.0);

        SignalSnapshot {
            price,
            rsi: rsi(closes, RSI_PERIOD),
            macd_histogram: macd(closes).map(|m| m.histogram),
            sma_fast: sma(closes, SMA_FAST_PERIOD),
            sma_slow: sma(closes, SMA_SLOW_PERIOD),
            percent_b: bollinger(closes, BOLLINGER_PERIOD, BOLLINGER_K)
                .map(|b| b.percent_b(price)),
        }
    }

    /// Number of signals that could be computed.
    pub fn available(&self) -> usize {
        [
            self.rsi.is_some(),
            self.macd_histogram.is_some(),
            self.sma_fast.is_some() && self.sma_slow.is_some(),
            self.percent_b.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }
}
