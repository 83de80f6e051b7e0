//! User content rows: watchlist items, trading notes, news articles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Decimal, Symbol, TimeMs};

/// A user-saved symbol with an optional price-alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: Symbol,
    /// Alert fires when the latest price crosses this level.
    pub alert_above: Option<Decimal>,
    pub alert_below: Option<Decimal>,
    pub note: Option<String>,
    pub created_at: TimeMs,
}

impl WatchlistItem {
    /// True if the latest price triggers either alert bound.
    pub fn alert_triggered(&self, price: Decimal) -> bool {
        if let Some(above) = self.alert_above {
            if price >= above {
                return true;
            }
        }
        if let Some(below) = self.alert_below {
            if price <= below {
                return true;
            }
        }
        false
    }
}

/// A freeform per-user trading note with comma-separated tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: TimeMs,
    pub updated_at: TimeMs,
}

/// Sentiment bucket derived from a score in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Bucket a raw score: > 0.15 positive, < -0.15 negative, else neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 0.15 {
            SentimentLabel::Positive
        } else if score < -0.15 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

/// A news article row with a sentiment score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Stable dedup key: sha256 over (source, url).
    pub event_key: String,
    pub source: String,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    /// Score in [-1, 1].
    pub sentiment: f64,
    pub published_at: TimeMs,
}

impl NewsArticle {
    pub fn new(
        source: String,
        url: String,
        title: String,
        summary: Option<String>,
        sentiment: f64,
        published_at: TimeMs,
    ) -> Self {
        let event_key = Self::compute_event_key(&source, &url);
        NewsArticle {
            event_key,
            source,
            url,
            title,
            summary,
            sentiment,
            published_at,
        }
    }

    /// Deterministic dedup key so re-posting an article is a no-op.
    pub fn compute_event_key(source: &str, url: &str) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_score(self.sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn item(above: Option<&str>, below: Option<&str>) -> WatchlistItem {
        WatchlistItem {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: Symbol::btcusdt(),
            alert_above: above.map(dec),
            alert_below: below.map(dec),
            note: None,
            created_at: TimeMs::new(0),
        }
    }

    #[test]
    fn test_alert_above() {
        let w = item(Some("70000"), None);
        assert!(w.alert_triggered(dec("70000")));
        assert!(w.alert_triggered(dec("71000")));
        assert!(!w.alert_triggered(dec("69999")));
    }

    #[test]
    fn test_alert_below() {
        let w = item(None, Some("50000"));
        assert!(w.alert_triggered(dec("49000")));
        assert!(!w.alert_triggered(dec("50001")));
    }

    #[test]
    fn test_no_alert_configured() {
        assert!(!item(None, None).alert_triggered(dec("1")));
    }

    #[test]
    fn test_sentiment_buckets() {
        assert_eq!(SentimentLabel::from_score(0.5), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.15), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.15), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.2), SentimentLabel::Negative);
    }

    #[test]
    fn test_event_key_stable() {
        let a = NewsArticle::compute_event_key("coindesk", "https://x/1");
        let b = NewsArticle::compute_event_key("coindesk", "https://x/1");
        let c = NewsArticle::compute_event_key("coindesk", "https://x/2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
