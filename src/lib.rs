pub mod api;
pub mod auth;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod indicators;
pub mod search;

pub use config::{Config, FeedMode};
pub use datasource::{BinanceSource, PriceSource, PriceSourceError, SyntheticSource};
pub use db::{init_db, Repository};
pub use domain::{
    Agent, AnalysisReport, Candle, ChatMessage, Decimal, Interval, NewsArticle, Personality,
    Portfolio, Recommendation, Side, Symbol, TimeMs, Trade, TradingNote, User, WatchlistItem,
};
pub use error::AppError;
pub use feed::{PriceTick, TickerFeed};
