//! Core domain types for the trading game.

pub mod account;
pub mod agent;
pub mod candle;
pub mod content;
pub mod decimal;
pub mod primitives;

pub use account::{Portfolio, Trade, User};
pub use agent::{
    Agent, AnalysisReport, ChatMessage, ChatRole, Personality, Recommendation, Thresholds,
};
pub use candle::{Candle, Interval};
pub use content::{NewsArticle, SentimentLabel, TradingNote, WatchlistItem};
pub use decimal::Decimal;
pub use primitives::{Side, Symbol, TimeMs};
