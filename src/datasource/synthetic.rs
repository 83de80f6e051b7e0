//! Synthetic price source used when the external API is unreachable or the
//! game runs in demo mode.
//!
//! Prices follow a seeded random walk, so a fixed seed always produces the
//! same series.

use super::{PriceSource, PriceSourceError, Tick};
use crate::domain::{Candle, Interval, Symbol, TimeMs};
use async_trait::async_trait;

/// Small deterministic generator (64-bit LCG, top bits used).
#[derive(Debug, Clone)]
pub(crate) struct Lcg {
    state: u64,
}

impl Lcg {
    pub(crate) fn new(seed: u64) -> Self {
        Lcg {
            state: seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407),
        }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 11
    }

    /// Uniform in [0, 1).
    pub(crate) fn next_unit(&mut self) -> f64 {
        (self.next_u64() % (1 << 53)) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [-1, 1).
    pub(crate) fn next_signed(&mut self) -> f64 {
        self.next_unit() * 2.0 - 1.0
    }
}

/// Synthetic random-walk price source.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    base_price: f64,
    /// Per-step drift bound as a fraction of price.
    step_pct: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base_price: 60_000.0,
            step_pct: 0.002,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Stable per-symbol stream so BTCUSDT and ETHUSDT walks differ.
    fn stream_for(&self, symbol: &Symbol) -> Lcg {
        let mut h: u64 = self.seed;
        for b in symbol.as_str().bytes() {
            h = h.wrapping_mul(31).wrapping_add(b as u64);
        }
        Lcg::new(h)
    }

    /// Generate `limit` candles ending at the current interval boundary.
    pub fn walk_candles(&self, symbol: &Symbol, interval: Interval, limit: u32) -> Vec<Candle> {
        let mut rng = self.stream_for(symbol);
        let step_ms = interval.duration_ms();
        let now = chrono::Utc::now().timestamp_millis();
        let last_open = (now / step_ms) * step_ms;
        let first_open = last_open - step_ms * (limit.saturating_sub(1) as i64);

        let mut candles = Vec::with_capacity(limit as usize);
        let mut price = self.base_price;

        for i in 0..limit as i64 {
            let open = price;
            let drift = rng.next_signed() * self.step_pct;
            let close = (open * (1.0 + drift)).max(1.0);
            let wiggle_hi = rng.next_unit() * self.step_pct * open;
            let wiggle_lo = rng.next_unit() * self.step_pct * open;
            let high = open.max(close) + wiggle_hi;
            let low = (open.min(close) - wiggle_lo).max(0.5);
            let volume = 50.0 + rng.next_unit() * 200.0;

            candles.push(Candle::new(
                TimeMs::new(first_open + i * step_ms),
                open,
                high,
                low,
                close,
                volume,
            ));
            price = close;
        }

        candles
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl PriceSource for SyntheticSource {
    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Tick, PriceSourceError> {
        let last = self
            .walk_candles(symbol, Interval::OneMinute, 240)
            .last()
            .map(|c| c.close)
            .unwrap_or(self.base_price);

        Ok(Tick {
            time_ms: chrono::Utc::now().timestamp_millis(),
            price: last,
        })
    }

    async fn fetch_klines(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceSourceError> {
        Ok(self.walk_candles(symbol, interval, limit))
    }
}
