//! Live tick hub: relays Binance WebSocket trades into a broadcast channel
//! and keeps the latest price per symbol for trade execution and alerts.
//!
//! In synthetic mode (or after the relay gives up reconnecting) a seeded
//! random walk publishes into the same channel, so downstream consumers
//! never care where ticks come from.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::datasource::synthetic::Lcg;
use crate::domain::Symbol;

/// A single price tick, as published to SSE clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    pub symbol: String,
    pub time_ms: i64,
    pub price: f64,
}

/// Broadcast hub for price ticks.
#[derive(Debug)]
pub struct TickerFeed {
    latest: RwLock<HashMap<String, PriceTick>>,
    tx: broadcast::Sender<PriceTick>,
}

const BROADCAST_CAPACITY: usize = 1024;
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);
/// Consecutive connection failures before falling back to synthetic ticks.
const FALLBACK_AFTER_FAILURES: u32 = 5;
const SYNTHETIC_TICK_INTERVAL: Duration = Duration::from_secs(1);

impl TickerFeed {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Arc::new(Self {
            latest: RwLock::new(HashMap::new()),
            tx,
        })
    }

    /// Subscribe to the tick stream. Slow receivers drop ticks rather than
    /// blocking the feed.
    pub fn subscribe(&self) -> broadcast::Receiver<PriceTick> {
        self.tx.subscribe()
    }

    /// Latest known tick for a symbol, if any has been published.
    pub fn latest(&self, symbol: &Symbol) -> Option<PriceTick> {
        self.latest
            .read()
            .ok()
            .and_then(|map| map.get(symbol.as_str()).cloned())
    }

    /// Publish a tick: updates the latest cell and notifies subscribers.
    pub fn publish(&self, tick: PriceTick) {
        if let Ok(mut map) = self.latest.write() {
            map.insert(tick.symbol.clone(), tick.clone());
        }
        // No receivers is fine; the latest cell still updates.
        let _ = self.tx.send(tick);
    }

    /// Spawn the live relay task: connect to the Binance trade stream for
    /// `symbol` and republish every trade. Falls back to synthetic ticks
    /// after repeated connection failures.
    pub fn spawn_live(self: Arc<Self>, ws_base_url: String, symbol: Symbol) {
        tokio::spawn(async move {
            self.run_live(ws_base_url, symbol).await;
        });
    }

    /// Spawn the synthetic tick task: a seeded random walk at ~1Hz.
    pub fn spawn_synthetic(self: Arc<Self>, seed: u64, symbol: Symbol, base_price: f64) {
        tokio::spawn(async move {
            self.run_synthetic(seed, symbol, base_price).await;
        });
    }

    async fn run_live(self: Arc<Self>, ws_base_url: String, symbol: Symbol) {
        let url = format!(
            "{}/{}@trade",
            ws_base_url.trim_end_matches('/'),
            symbol.as_str().to_ascii_lowercase()
        );
        let mut retry_delay = Duration::from_secs(1);
        let mut consecutive_failures = 0u32;

        loop {
            match connect_async(&url).await {
                Ok((ws_stream, _)) => {
                    info!("tick relay connected ({})", url);
                    retry_delay = Duration::from_secs(1);
                    consecutive_failures = 0;

                    let (mut write, mut read) = ws_stream.split();
                    while let Some(message) = read.next().await {
                        match message {
                            Ok(Message::Text(txt)) => {
                                if let Some(tick) = parse_trade_event(&txt) {
                                    self.publish(tick);
                                }
                            }
                            Ok(Message::Ping(payload)) => {
                                if write.send(Message::Pong(payload)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(Message::Close(_)) => {
                                warn!("tick relay stream closed by server");
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "tick relay read error");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        error = %e,
                        failures = consecutive_failures,
                        "tick relay connection failed"
                    );

                    if consecutive_failures >= FALLBACK_AFTER_FAILURES {
                        warn!("tick relay unreachable, switching to synthetic ticks");
                        let base = self
                            .latest(&symbol)
                            .map(|t| t.price)
                            .unwrap_or(60_000.0);
                        self.run_synthetic(consecutive_failures as u64, symbol, base)
                            .await;
                        return;
                    }
                }
            }

            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(MAX_RECONNECT_DELAY);
        }
    }

    async fn run_synthetic(&self, seed: u64, symbol: Symbol, base_price: f64) {
        let mut rng = Lcg::new(seed);
        let mut price = base_price;
        let mut interval = tokio::time::interval(SYNTHETIC_TICK_INTERVAL);

        debug!("synthetic tick generator running for {}", symbol);
        loop {
            interval.tick().await;
            price = (price * (1.0 + rng.next_signed() * 0.0005)).max(1.0);
            self.publish(PriceTick {
                symbol: symbol.as_str().to_string(),
                time_ms: chrono::Utc::now().timestamp_millis(),
                price,
            });
        }
    }
}

/// Parse a Binance trade stream event: {"s": "BTCUSDT", "p": "60000.1", "T": 1700000000000}.
fn parse_trade_event(txt: &str) -> Option<PriceTick> {
    let value: serde_json::Value = serde_json::from_str(txt).ok()?;
    let symbol = value.get("s")?.as_str()?.to_string();
    let price = value.get("p")?.as_str()?.parse::<f64>().ok()?;
    let time_ms = value.get("T")?.as_i64()?;

    if !price.is_finite() || price <= 0.0 {
        return None;
    }

    Some(PriceTick {
        symbol,
        time_ms,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trade_event() {
        let txt = r#"{"e":"trade","s":"BTCUSDT","p":"60250.40","q":"0.01","T":1700000000123}"#;
        let tick = parse_trade_event(txt).unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.time_ms, 1700000000123);
        assert!((tick.price - 60250.40).abs() < 1e-9);
    }

    #[test]
    fn test_parse_trade_event_rejects_bad_payloads() {
        assert!(parse_trade_event("not json").is_none());
        assert!(parse_trade_event(r#"{"s":"BTCUSDT"}"#).is_none());
        assert!(parse_trade_event(r#"{"s":"BTCUSDT","p":"-5","T":1}"#).is_none());
        assert!(parse_trade_event(r#"{"s":"BTCUSDT","p":"abc","T":1}"#).is_none());
    }

    #[tokio::test]
    async fn test_publish_updates_latest_and_broadcasts() {
        let feed = TickerFeed::new();
        let mut rx = feed.subscribe();

        let tick = PriceTick {
            symbol: "BTCUSDT".to_string(),
            time_ms: 1000,
            price: 59_000.0,
        };
        feed.publish(tick.clone());

        assert_eq!(feed.latest(&Symbol::btcusdt()), Some(tick.clone()));
        assert_eq!(rx.recv().await.unwrap(), tick);
    }

    #[tokio::test]
    async fn test_latest_tracks_most_recent() {
        let feed = TickerFeed::new();
        for price in [1.0, 2.0, 3.0] {
            feed.publish(PriceTick {
                symbol: "BTCUSDT".to_string(),
                time_ms: price as i64,
                price,
            });
        }
        assert_eq!(feed.latest(&Symbol::btcusdt()).unwrap().price, 3.0);
        assert!(feed.latest(&Symbol::new("ETHUSDT")).is_none());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let feed = TickerFeed::new();
        feed.publish(PriceTick {
            symbol: "BTCUSDT".to_string(),
            time_ms: 1,
            price: 2.0,
        });
        assert!(feed.latest(&Symbol::btcusdt()).is_some());
    }

    #[tokio::test]
    async fn test_synthetic_generator_publishes() {
        let feed = TickerFeed::new();
        let mut rx = feed.subscribe();
        feed.clone().spawn_synthetic(7, Symbol::btcusdt(), 50_000.0);

        let tick = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no tick within timeout")
            .unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert!(tick.price > 0.0);
    }
}
