//! News article and pattern-hit operations for the repository.

use crate::domain::{Interval, NewsArticle, SentimentLabel, Symbol, TimeMs};
use sqlx::Row;

use super::Repository;

/// Aggregated sentiment over a window of articles.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentSummary {
    pub article_count: i64,
    pub average_score: f64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

impl SentimentSummary {
    /// The bucket with the most articles; ties resolve toward neutral.
    pub fn dominant(&self) -> SentimentLabel {
        if self.positive > self.neutral && self.positive > self.negative {
            SentimentLabel::Positive
        } else if self.negative > self.neutral && self.negative > self.positive {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// A detected candlestick pattern on a specific candle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternHitRow {
    pub symbol: Symbol,
    pub interval: Interval,
    pub open_time: TimeMs,
    pub pattern: String,
    pub detected_at: TimeMs,
}

impl Repository {
    /// Insert a news article idempotently by event key.
    pub async fn insert_news(&self, article: &NewsArticle) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO news_articles (
                event_key, source, url, title, summary, sentiment, published_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_key) DO NOTHING
            "#,
        )
        .bind(article.event_key.as_str())
        .bind(article.source.as_str())
        .bind(article.url.as_str())
        .bind(article.title.as_str())
        .bind(article.summary.as_deref())
        .bind(article.sentiment)
        .bind(article.published_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List articles, most recently published first.
    pub async fn list_news(&self, limit: i64) -> Result<Vec<NewsArticle>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_key, source, url, title, summary, sentiment, published_at
            FROM news_articles
            ORDER BY published_at DESC, event_key DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| NewsArticle {
                event_key: r.get("event_key"),
                source: r.get("source"),
                url: r.get("url"),
                title: r.get("title"),
                summary: r.get("summary"),
                sentiment: r.get("sentiment"),
                published_at: TimeMs::new(r.get("published_at")),
            })
            .collect())
    }

    /// Aggregate sentiment over articles published at or after `since`.
    pub async fn sentiment_summary(
        &self,
        since: TimeMs,
    ) -> Result<SentimentSummary, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS article_count,
                COALESCE(AVG(sentiment), 0.0) AS average_score,
                COALESCE(SUM(CASE WHEN sentiment > 0.15 THEN 1 ELSE 0 END), 0) AS positive,
                COALESCE(SUM(CASE WHEN sentiment < -0.15 THEN 1 ELSE 0 END), 0) AS negative
            FROM news_articles
            WHERE published_at >= ?
            "#,
        )
        .bind(since.as_i64())
        .fetch_one(self.pool())
        .await?;

        let article_count: i64 = row.get("article_count");
        let positive: i64 = row.get("positive");
        let negative: i64 = row.get("negative");

        Ok(SentimentSummary {
            article_count,
            average_score: row.get("average_score"),
            positive,
            neutral: article_count - positive - negative,
            negative,
        })
    }

    // =========================================================================
    // Pattern hits
    // =========================================================================

    /// Insert detected patterns, skipping ones already recorded.
    ///
    /// Returns the number of newly inserted rows.
    pub async fn insert_pattern_hits(
        &self,
        hits: &[PatternHitRow],
    ) -> Result<usize, sqlx::Error> {
        if hits.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0usize;
        let mut tx = self.pool().begin().await?;

        for hit in hits {
            let result = sqlx::query(
                r#"
                INSERT INTO pattern_hits (symbol, interval, open_time, pattern, detected_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(symbol, interval, open_time, pattern) DO NOTHING
                "#,
            )
            .bind(hit.symbol.as_str())
            .bind(hit.interval.as_str())
            .bind(hit.open_time.as_i64())
            .bind(hit.pattern.as_str())
            .bind(hit.detected_at.as_i64())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// List recorded pattern hits for a symbol, newest candle first.
    pub async fn list_pattern_hits(
        &self,
        symbol: &Symbol,
        limit: i64,
    ) -> Result<Vec<PatternHitRow>, sqlx::Error> {
        use std::str::FromStr;

        let rows = sqlx::query(
            r#"
            SELECT symbol, interval, open_time, pattern, detected_at
            FROM pattern_hits
            WHERE symbol = ?
            ORDER BY open_time DESC, pattern ASC
            LIMIT ?
            "#,
        )
        .bind(symbol.as_str())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                let interval_str: String = r.get("interval");
                Ok(PatternHitRow {
                    symbol: Symbol::new(r.get::<String, _>("symbol")),
                    interval: Interval::from_str(&interval_str).map_err(|_| {
                        sqlx::Error::Decode(format!("bad interval: {}", interval_str).into())
                    })?,
                    open_time: TimeMs::new(r.get("open_time")),
                    pattern: r.get("pattern"),
                    detected_at: TimeMs::new(r.get("detected_at")),
                })
            })
            .collect()
    }
}
