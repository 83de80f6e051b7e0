//! Account rows: User, Portfolio, Trade.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Decimal, Side, Symbol, TimeMs};

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// bcrypt hash, never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: TimeMs,
}

/// A user's simulated portfolio: quote-currency cash plus BTC holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub user_id: Uuid,
    pub cash: Decimal,
    pub btc_qty: Decimal,
    pub updated_at: TimeMs,
}

impl Portfolio {
    /// Fresh portfolio seeded with the configured starting cash.
    pub fn opening(user_id: Uuid, starting_cash: Decimal, now: TimeMs) -> Self {
        Portfolio {
            user_id,
            cash: starting_cash,
            btc_qty: Decimal::zero(),
            updated_at: now,
        }
    }

    /// Total valuation at the given BTC price.
    pub fn value_at(&self, btc_price: Decimal) -> Decimal {
        self.cash + self.btc_qty * btc_price
    }
}

/// An executed simulated trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    pub price: Decimal,
    pub executed_at: TimeMs,
}

impl Trade {
    /// Cash moved by this trade (qty * price), always positive.
    pub fn notional(&self) -> Decimal {
        self.qty * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_opening_portfolio() {
        let p = Portfolio::opening(Uuid::new_v4(), dec("10000"), TimeMs::new(1));
        assert_eq!(p.cash, dec("10000"));
        assert!(p.btc_qty.is_zero());
    }

    #[test]
    fn test_portfolio_valuation() {
        let mut p = Portfolio::opening(Uuid::new_v4(), dec("5000"), TimeMs::new(1));
        p.btc_qty = dec("0.1");
        assert_eq!(p.value_at(dec("60000")), dec("11000"));
    }

    #[test]
    fn test_trade_notional() {
        let t = Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: Symbol::btcusdt(),
            side: Side::Buy,
            qty: dec("0.5"),
            price: dec("40000"),
            executed_at: TimeMs::new(1),
        };
        assert_eq!(t.notional(), dec("20000"));
    }
}
