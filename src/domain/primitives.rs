//! Domain primitives: TimeMs, Symbol, Side.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time in milliseconds.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Market symbol in Binance spot notation (e.g., "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a Symbol, normalizing to uppercase.
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into().trim().to_ascii_uppercase())
    }

    /// The portfolio trading pair.
    pub fn btcusdt() -> Self {
        Symbol("BTCUSDT".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the symbol looks like a valid spot pair: 1..=20 alphanumeric chars.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= 20 && self.0.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed multiplier for this side (+1 for Buy, -1 for Sell).
    pub fn sign(&self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Buy.sign(), 1);
        assert_eq!(Side::Sell.sign(), -1);
    }

    #[test]
    fn test_side_roundtrip() {
        assert_eq!(Side::from_str("buy").unwrap(), Side::Buy);
        assert_eq!(Side::from_str(" SELL ").unwrap(), Side::Sell);
        assert!(Side::from_str("hold").is_err());
        assert_eq!(Side::Buy.to_string(), "buy");
    }

    #[test]
    fn test_symbol_normalizes() {
        let sym = Symbol::new(" btcusdt ");
        assert_eq!(sym.as_str(), "BTCUSDT");
        assert!(sym.is_valid());
    }

    #[test]
    fn test_symbol_rejects_garbage() {
        assert!(!Symbol::new("").is_valid());
        assert!(!Symbol::new("BTC/USDT").is_valid());
        assert!(!Symbol::new("A".repeat(30)).is_valid());
    }

    #[test]
    fn test_timems_ordering() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
    }
}
