//! Watchlist and trading-note operations for the repository.

use crate::domain::{Symbol, TimeMs, TradingNote, WatchlistItem};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_decimal, parse_uuid, Repository};

impl Repository {
    /// Insert a watchlist item. Returns false when the user already watches
    /// the symbol.
    pub async fn insert_watchlist_item(
        &self,
        item: &WatchlistItem,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO watchlist_items (
                id, user_id, symbol, alert_above, alert_below, note, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, symbol) DO NOTHING
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.user_id.to_string())
        .bind(item.symbol.as_str())
        .bind(item.alert_above.map(|d| d.to_canonical_string()))
        .bind(item.alert_below.map(|d| d.to_canonical_string()))
        .bind(item.note.as_deref())
        .bind(item.created_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_watchlist(&self, user_id: &Uuid) -> Result<Vec<WatchlistItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, symbol, alert_above, alert_below, note, created_at
            FROM watchlist_items WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(WatchlistItem {
                    id: parse_uuid(r.get("id"))?,
                    user_id: parse_uuid(r.get("user_id"))?,
                    symbol: Symbol::new(r.get::<String, _>("symbol")),
                    alert_above: r
                        .get::<Option<String>, _>("alert_above")
                        .map(parse_decimal)
                        .transpose()?,
                    alert_below: r
                        .get::<Option<String>, _>("alert_below")
                        .map(parse_decimal)
                        .transpose()?,
                    note: r.get("note"),
                    created_at: TimeMs::new(r.get("created_at")),
                })
            })
            .collect()
    }

    /// Delete a watchlist item owned by the user. Returns false when absent.
    pub async fn delete_watchlist_item(
        &self,
        user_id: &Uuid,
        id: &Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM watchlist_items WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Trading notes
    // =========================================================================

    pub async fn insert_note(&self, note: &TradingNote) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO trading_notes (id, user_id, title, body, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(note.id.to_string())
        .bind(note.user_id.to_string())
        .bind(note.title.as_str())
        .bind(note.body.as_str())
        .bind(note.tags.join(","))
        .bind(note.created_at.as_i64())
        .bind(note.updated_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// List a user's notes, most recently updated first.
    pub async fn list_notes(&self, user_id: &Uuid) -> Result<Vec<TradingNote>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, body, tags, created_at, updated_at
            FROM trading_notes WHERE user_id = ?
            ORDER BY updated_at DESC, id DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(|r| parse_note(&r)).collect()
    }

    pub async fn get_note(
        &self,
        user_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<TradingNote>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, body, tags, created_at, updated_at
            FROM trading_notes WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| parse_note(&r)).transpose()
    }

    /// Update title, body, tags, and updated_at. Returns false when absent.
    pub async fn update_note(&self, note: &TradingNote) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trading_notes SET title = ?, body = ?, tags = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(note.title.as_str())
        .bind(note.body.as_str())
        .bind(note.tags.join(","))
        .bind(note.updated_at.as_i64())
        .bind(note.id.to_string())
        .bind(note.user_id.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_note(&self, user_id: &Uuid, id: &Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trading_notes WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_note(row: &sqlx::sqlite::SqliteRow) -> Result<TradingNote, sqlx::Error> {
    let tags_str: String = row.get("tags");
    Ok(TradingNote {
        id: parse_uuid(row.get("id"))?,
        user_id: parse_uuid(row.get("user_id"))?,
        title: row.get("title"),
        body: row.get("body"),
        tags: if tags_str.is_empty() {
            Vec::new()
        } else {
            tags_str.split(',').map(|s| s.to_string()).collect()
        },
        created_at: TimeMs::new(row.get("created_at")),
        updated_at: TimeMs::new(row.get("updated_at")),
    })
}
