//! Portfolio and trade operations for the repository.

use crate::domain::{Portfolio, Side, Symbol, TimeMs, Trade};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use super::{parse_decimal, parse_uuid, Repository};

impl Repository {
    /// Create a portfolio row. Returns false if the user already has one.
    pub async fn insert_portfolio(&self, portfolio: &Portfolio) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO portfolios (user_id, cash, btc_qty, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(portfolio.user_id.to_string())
        .bind(portfolio.cash.to_canonical_string())
        .bind(portfolio.btc_qty.to_canonical_string())
        .bind(portfolio.updated_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_portfolio(&self, user_id: &Uuid) -> Result<Option<Portfolio>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT user_id, cash, btc_qty, updated_at FROM portfolios WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| {
            Ok(Portfolio {
                user_id: parse_uuid(r.get("user_id"))?,
                cash: parse_decimal(r.get("cash"))?,
                btc_qty: parse_decimal(r.get("btc_qty"))?,
                updated_at: TimeMs::new(r.get("updated_at")),
            })
        })
        .transpose()
    }

    /// Record an executed trade and the resulting balances in one transaction.
    ///
    /// The caller has already validated the trade against the current
    /// portfolio; this only persists the outcome atomically.
    pub async fn execute_trade(
        &self,
        trade: &Trade,
        updated: &Portfolio,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO trades (id, user_id, symbol, side, qty, price, executed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(trade.id.to_string())
        .bind(trade.user_id.to_string())
        .bind(trade.symbol.as_str())
        .bind(trade.side.to_string())
        .bind(trade.qty.to_canonical_string())
        .bind(trade.price.to_canonical_string())
        .bind(trade.executed_at.as_i64())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE portfolios SET cash = ?, btc_qty = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(updated.cash.to_canonical_string())
        .bind(updated.btc_qty.to_canonical_string())
        .bind(updated.updated_at.as_i64())
        .bind(updated.user_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List a user's trades, most recent first.
    pub async fn list_trades(
        &self,
        user_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, symbol, side, qty, price, executed_at
            FROM trades
            WHERE user_id = ?
            ORDER BY executed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                let side_str: String = r.get("side");
                Ok(Trade {
                    id: parse_uuid(r.get("id"))?,
                    user_id: parse_uuid(r.get("user_id"))?,
                    symbol: Symbol::new(r.get::<String, _>("symbol")),
                    side: Side::from_str(&side_str)
                        .map_err(|_| sqlx::Error::Decode(format!("bad side: {}", side_str).into()))?,
                    qty: parse_decimal(r.get("qty"))?,
                    price: parse_decimal(r.get("price"))?,
                    executed_at: TimeMs::new(r.get("executed_at")),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::{Decimal, User};
    use tempfile::TempDir;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    async fn repo_with_user() -> (Repository, Uuid, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Repository::new(pool);

        let user = User {
            id: Uuid::new_v4(),
            username: "player".to_string(),
            password_hash: "hash".to_string(),
            created_at: TimeMs::new(0),
        };
        repo.insert_user(&user).await.unwrap();
        let portfolio = Portfolio::opening(user.id, dec("10000"), TimeMs::new(0));
        repo.insert_portfolio(&portfolio).await.unwrap();

        (repo, user.id, temp_dir)
    }

    #[tokio::test]
    async fn test_portfolio_roundtrip() {
        let (repo, user_id, _temp) = repo_with_user().await;
        let p = repo.get_portfolio(&user_id).await.unwrap().unwrap();
        assert_eq!(p.cash, dec("10000"));
        assert!(p.btc_qty.is_zero());
    }

    #[tokio::test]
    async fn test_insert_portfolio_twice_is_noop() {
        let (repo, user_id, _temp) = repo_with_user().await;
        let again = Portfolio::opening(user_id, dec("99999"), TimeMs::new(5));
        assert!(!repo.insert_portfolio(&again).await.unwrap());
        let p = repo.get_portfolio(&user_id).await.unwrap().unwrap();
        assert_eq!(p.cash, dec("10000"));
    }

    #[tokio::test]
    async fn test_execute_trade_updates_balances() {
        let (repo, user_id, _temp) = repo_with_user().await;

        let trade = Trade {
            id: Uuid::new_v4(),
            user_id,
            symbol: Symbol::btcusdt(),
            side: Side::Buy,
            qty: dec("0.1"),
            price: dec("50000"),
            executed_at: TimeMs::new(1000),
        };
        let updated = Portfolio {
            user_id,
            cash: dec("5000"),
            btc_qty: dec("0.1"),
            updated_at: TimeMs::new(1000),
        };

        repo.execute_trade(&trade, &updated).await.unwrap();

        let p = repo.get_portfolio(&user_id).await.unwrap().unwrap();
        assert_eq!(p.cash, dec("5000"));
        assert_eq!(p.btc_qty, dec("0.1"));

        let trades = repo.list_trades(&user_id, 10).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0], trade);
    }

    #[tokio::test]
    async fn test_list_trades_most_recent_first() {
        let (repo, user_id, _temp) = repo_with_user().await;

        for (i, t) in [1000i64, 3000, 2000].iter().enumerate() {
            let trade = Trade {
                id: Uuid::new_v4(),
                user_id,
                symbol: Symbol::btcusdt(),
                side: if i % 2 == 0 { Side::Buy } else { Side::Sell },
                qty: dec("0.01"),
                price: dec("40000"),
                executed_at: TimeMs::new(*t),
            };
            let p = repo.get_portfolio(&user_id).await.unwrap().unwrap();
            repo.execute_trade(&trade, &p).await.unwrap();
        }

        let trades = repo.list_trades(&user_id, 10).await.unwrap();
        let times: Vec<i64> = trades.iter().map(|t| t.executed_at.as_i64()).collect();
        assert_eq!(times, vec![3000, 2000, 1000]);

        let limited = repo.list_trades(&user_id, 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }
}
