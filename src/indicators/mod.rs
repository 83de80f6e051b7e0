//! Technical indicators over historical closing prices.
//!
//! Standard formulas on f64 slices. Every function returns `None` when the
//! series is too short for its period.

pub mod patterns;

pub use patterns::{detect_patterns, CandlePattern, PatternHit};

/// MACD line, signal line, and histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Bollinger Bands around a simple moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bollinger {
    /// Position of `price` within the bands: 0 at lower, 1 at upper.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width <= f64::EPSILON {
            return 0.5;
        }
        (price - self.lower) / width
    }
}

/// Stochastic oscillator %K and %D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

/// Simple moving average over the trailing `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: f64 = values.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Exponential moving average, seeded with the first value.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.is_empty() {
        return None;
    }

    Some(*ema_series(values, period).last().unwrap())
}

/// Running EMA at every index, seeded with the first value.
fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = values[0];
    out.push(current);

    for &value in values.iter().skip(1) {
        current = (value - current) * multiplier + current;
        out.push(current);
    }

    out
}

/// Relative Strength Index over the trailing `period` changes.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::new();
    let mut losses = Vec::new();

    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let avg_gain: f64 = gains.iter().rev().take(period).sum::<f64>() / period as f64;
    let avg_loss: f64 = losses.iter().rev().take(period).sum::<f64>() / period as f64;

    if avg_loss < 1e-10 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// MACD(12, 26, 9). Needs at least 35 closes for a meaningful signal line.
pub fn macd(closes: &[f64]) -> Option<Macd> {
    const FAST: usize = 12;
    const SLOW: usize = 26;
    const SIGNAL: usize = 9;

    if closes.len() < SLOW + SIGNAL {
        return None;
    }

    let fast = ema_series(closes, FAST);
    let slow = ema_series(closes, SLOW);
    let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal_line = ema_series(&macd_line, SIGNAL);

    let macd_value = *macd_line.last().unwrap();
    let signal_value = *signal_line.last().unwrap();

    Some(Macd {
        macd: macd_value,
        signal: signal_value,
        histogram: macd_value - signal_value,
    })
}

/// Bollinger Bands: `period`-SMA ± `k` standard deviations.
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Option<Bollinger> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let dev = std_dev(window);

    Some(Bollinger {
        upper: middle + k * dev,
        middle,
        lower: middle - k * dev,
    })
}

/// Stochastic oscillator: %K over `k_period` highs/lows, %D as the
/// `d_period`-SMA of %K.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> Option<Stochastic> {
    let n = closes.len();
    if k_period == 0 || d_period == 0 || n != highs.len() || n != lows.len() {
        return None;
    }
    if n < k_period + d_period - 1 {
        return None;
    }

    let k_at = |end: usize| -> f64 {
        let window_start = end + 1 - k_period;
        let highest = highs[window_start..=end]
            .iter()
            .fold(f64::MIN, |a, &b| a.max(b));
        let lowest = lows[window_start..=end]
            .iter()
            .fold(f64::MAX, |a, &b| a.min(b));
        let range = highest - lowest;
        if range <= f64::EPSILON {
            50.0
        } else {
            100.0 * (closes[end] - lowest) / range
        }
    };

    let k_values: Vec<f64> = (n - d_period..n).map(k_at).collect();
    let k = *k_values.last().unwrap();
    let d = k_values.iter().sum::<f64>() / d_period as f64;

    Some(Stochastic { k, d })
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
    let variance: f64 =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_basic() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 3), Some(4.0));
        assert_eq!(sma(&values, 5), Some(3.0));
        assert_eq!(sma(&values, 6), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![10.0; 20];
        let result = ema(&values, 5).unwrap();
        assert!((result - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_tracks_trend() {
        let rising: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let fast = ema(&rising, 5).unwrap();
        let slow = ema(&rising, 20).unwrap();
        assert!(fast > slow, "fast EMA should sit above slow in an uptrend");
        assert!(ema(&[], 5).is_none());
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let rising: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        assert_eq!(rsi(&rising, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_near_zero() {
        let falling: Vec<f64> = (1..=20).rev().map(|i| i as f64).collect();
        let value = rsi(&falling, 14).unwrap();
        assert!(value < 1.0, "got {}", value);
    }

    #[test]
    fn test_rsi_balanced_near_50() {
        // Alternating equal up/down moves.
        let mut closes = vec![100.0];
        for i in 0..30 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let value = rsi(&closes, 14).unwrap();
        assert!((value - 50.0).abs() < 5.0, "got {}", value);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert_eq!(rsi(&[1.0, 2.0], 14), None);
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let values = vec![100.0; 50];
        let m = macd(&values).unwrap();
        assert!(m.macd.abs() < 1e-9);
        assert!(m.signal.abs() < 1e-9);
        assert!(m.histogram.abs() < 1e-9);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let rising: Vec<f64> = (1..=60).map(|i| 100.0 + i as f64).collect();
        let m = macd(&rising).unwrap();
        assert!(m.macd > 0.0);
    }

    #[test]
    fn test_macd_insufficient_data() {
        let values = vec![100.0; 30];
        assert!(macd(&values).is_none());
    }

    #[test]
    fn test_bollinger_flat_series() {
        let values = vec![50.0; 25];
        let b = bollinger(&values, 20, 2.0).unwrap();
        assert_eq!(b.middle, 50.0);
        assert_eq!(b.upper, 50.0);
        assert_eq!(b.lower, 50.0);
        assert_eq!(b.percent_b(50.0), 0.5);
    }

    #[test]
    fn test_bollinger_bands_bracket_mean() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + (i % 5) as f64).collect();
        let b = bollinger(&values, 20, 2.0).unwrap();
        assert!(b.upper > b.middle);
        assert!(b.lower < b.middle);
        assert!(b.percent_b(b.upper) > 0.99);
        assert!(b.percent_b(b.lower) < 0.01);
    }

    #[test]
    fn test_bollinger_insufficient_data() {
        assert!(bollinger(&[1.0, 2.0], 20, 2.0).is_none());
    }

    #[test]
    fn test_stochastic_at_high_and_low() {
        let n = 20;
        let highs: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let lows: Vec<f64> = (0..n).map(|i| 90.0 + i as f64).collect();
        // Close at the running high -> %K near 100.
        let closes = highs.clone();
        let s = stochastic(&highs, &lows, &closes, 14, 3).unwrap();
        assert!(s.k > 95.0);
        assert!(s.d > 90.0);

        // Close at the running low -> %K near 0.
        let closes = lows.clone();
        let s = stochastic(&highs, &lows, &closes, 14, 3).unwrap();
        assert!(s.k < 5.0);
    }

    #[test]
    fn test_stochastic_mismatched_lengths() {
        assert!(stochastic(&[1.0], &[1.0, 2.0], &[1.0], 1, 1).is_none());
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
        let dev = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((dev - 2.0).abs() < 1e-9);
    }
}
