//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `trades.rs` - portfolio and trade operations
//! - `agents.rs` - agent, report, and chat operations
//! - `content.rs` - watchlist and trading-note operations
//! - `news.rs` - news article and pattern-hit operations

mod agents;
mod content;
mod news;
mod trades;

use crate::domain::{TimeMs, User};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use uuid::Uuid;

pub use news::{PatternHitRow, SentimentSummary};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // User operations
    // =========================================================================

    /// Insert a user. Returns false when the username is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(user.id.to_string())
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| parse_user(&r)).transpose()
    }

    pub async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| parse_user(&r)).transpose()
    }
}

fn parse_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: parse_uuid(row.get("id"))?,
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: TimeMs::new(row.get("created_at")),
    })
}

/// Parse a TEXT uuid column, surfacing corruption as a decode error.
pub(crate) fn parse_uuid(s: String) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Parse a canonical-string decimal column.
pub(crate) fn parse_decimal(s: String) -> Result<crate::domain::Decimal, sqlx::Error> {
    crate::domain::Decimal::from_str_canonical(&s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
