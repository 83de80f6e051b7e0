//! Binance public REST API client.

use super::{PriceSource, PriceSourceError, Tick};
use crate::domain::{Candle, Interval, Symbol, TimeMs};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Price source backed by the Binance spot REST API.
#[derive(Debug, Clone)]
pub struct BinanceSource {
    client: Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Create with the public Binance API URL.
    pub fn default_url() -> Self {
        Self::new("https://api.binance.com".to_string())
    }

    async fn get_json(&self, url: String) -> Result<serde_json::Value, PriceSourceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(PriceSourceError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(PriceSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(PriceSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(PriceSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(PriceSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceSource for BinanceSource {
    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Tick, PriceSourceError> {
        debug!("Fetching ticker for symbol={}", symbol);

        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.base_url,
            symbol.as_str()
        );
        let response = self.get_json(url).await?;

        let price_str = response
            .get("price")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PriceSourceError::ParseError("Missing price field".to_string()))?;
        let price = price_str
            .parse::<f64>()
            .map_err(|e| PriceSourceError::ParseError(format!("Invalid price: {}", e)))?;

        Ok(Tick {
            time_ms: chrono::Utc::now().timestamp_millis(),
            price,
        })
    }

    async fn fetch_klines(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceSourceError> {
        debug!(
            "Fetching klines for symbol={}, interval={}, limit={}",
            symbol, interval, limit
        );

        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.as_str(),
            interval.as_str(),
            limit
        );
        let response = self.get_json(url).await?;

        let klines = response
            .as_array()
            .ok_or_else(|| PriceSourceError::ParseError("Expected array response".to_string()))?;

        let mut candles = Vec::with_capacity(klines.len());
        for kline in klines {
            match parse_kline(kline) {
                Ok(candle) => candles.push(candle),
                Err(e) => {
                    warn!("Failed to parse kline: {}", e);
                }
            }
        }

        Ok(candles)
    }
}

/// Parse one Binance kline array:
/// [openTime, open, high, low, close, volume, closeTime, ...]
/// where prices and volume are decimal strings.
fn parse_kline(kline: &serde_json::Value) -> Result<Candle, PriceSourceError> {
    let fields = kline
        .as_array()
        .ok_or_else(|| PriceSourceError::ParseError("Expected kline array".to_string()))?;
    if fields.len() < 6 {
        return Err(PriceSourceError::ParseError(format!(
            "Kline too short: {} fields",
            fields.len()
        )));
    }

    let open_time = fields[0]
        .as_i64()
        .ok_or_else(|| PriceSourceError::ParseError("Missing openTime".to_string()))?;

    let price_at = |idx: usize, name: &str| -> Result<f64, PriceSourceError> {
        fields[idx]
            .as_str()
            .ok_or_else(|| PriceSourceError::ParseError(format!("Missing {}", name)))?
            .parse::<f64>()
            .map_err(|e| PriceSourceError::ParseError(format!("Invalid {}: {}", name, e)))
    };

    Ok(Candle::new(
        TimeMs::new(open_time),
        price_at(1, "open")?,
        price_at(2, "high")?,
        price_at(3, "low")?,
        price_at(4, "close")?,
        price_at(5, "volume")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kline_valid() {
        let kline = serde_json::json!([
            1700000000000i64,
            "60000.1",
            "60500.2",
            "59800.3",
            "60250.4",
            "123.45",
            1700000059999i64
        ]);

        let candle = parse_kline(&kline).unwrap();
        assert_eq!(candle.open_time, TimeMs::new(1700000000000));
        assert!((candle.open - 60000.1).abs() < 1e-9);
        assert!((candle.high - 60500.2).abs() < 1e-9);
        assert!((candle.low - 59800.3).abs() < 1e-9);
        assert!((candle.close - 60250.4).abs() < 1e-9);
        assert!((candle.volume - 123.45).abs() < 1e-9);
    }

    #[test]
    fn test_parse_kline_too_short() {
        let kline = serde_json::json!([1700000000000i64, "60000"]);
        assert!(parse_kline(&kline).is_err());
    }

    #[test]
    fn test_parse_kline_bad_price() {
        let kline = serde_json::json!([
            1700000000000i64,
            "not-a-number",
            "60500",
            "59800",
            "60250",
            "123"
        ]);
        assert!(parse_kline(&kline).is_err());
    }

    #[test]
    fn test_parse_kline_not_array() {
        assert!(parse_kline(&serde_json::json!({"open": "1"})).is_err());
    }
}
