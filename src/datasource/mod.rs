//! Price source abstraction for fetching tickers and klines.

use crate::domain::{Candle, Interval, Symbol};
use async_trait::async_trait;
use std::fmt;

pub mod binance;
pub mod synthetic;

pub use binance::BinanceSource;
pub use synthetic::SyntheticSource;

/// A point-in-time price for a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub time_ms: i64,
    pub price: f64,
}

/// Price source trait for fetching current tickers and historical klines.
///
/// Implementations must handle retry/backoff and rate limiting.
#[async_trait]
pub trait PriceSource: Send + Sync + fmt::Debug {
    /// Fetch the latest traded price for a symbol.
    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Tick, PriceSourceError>;

    /// Fetch up to `limit` most recent klines for a symbol, oldest first.
    async fn fetch_klines(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceSourceError>;
}

/// Error type for price source operations.
#[derive(Debug, Clone)]
pub enum PriceSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for PriceSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            PriceSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            PriceSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            PriceSourceError::RateLimited => write!(f, "Rate limited"),
            PriceSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for PriceSourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_source_error_display() {
        let err = PriceSourceError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = PriceSourceError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = PriceSourceError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        assert_eq!(PriceSourceError::RateLimited.to_string(), "Rate limited");
    }
}
