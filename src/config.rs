use std::collections::HashMap;
use thiserror::Error;

use crate::domain::Decimal;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub binance_api_url: String,
    pub binance_ws_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub starting_cash: Decimal,
    pub feed_mode: FeedMode,
    pub search_api_url: Option<String>,
}

/// Where live ticks come from: the Binance WebSocket or a synthetic walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Live,
    Synthetic,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let binance_api_url = env_map
            .get("BINANCE_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://api.binance.com".to_string());

        let binance_ws_url = env_map
            .get("BINANCE_WS_URL")
            .cloned()
            .unwrap_or_else(|| "wss://stream.binance.com:9443/ws".to_string());

        let jwt_secret = env_map
            .get("JWT_SECRET")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("JWT_SECRET".to_string()))?;
        if jwt_secret.len() < 16 {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "must be at least 16 characters".to_string(),
            ));
        }

        let token_ttl_hours = env_map
            .get("TOKEN_TTL_HOURS")
            .map(|s| s.as_str())
            .unwrap_or("24")
            .parse::<i64>()
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "TOKEN_TTL_HOURS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let starting_cash = env_map
            .get("STARTING_CASH")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<Decimal>()
            .ok()
            .filter(|c| c.is_positive())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "STARTING_CASH".to_string(),
                    "must be a positive decimal".to_string(),
                )
            })?;

        let feed_mode = match env_map.get("FEED_MODE").map(|s| s.as_str()).unwrap_or("live") {
            "live" => FeedMode::Live,
            "synthetic" => FeedMode::Synthetic,
            other => {
                return Err(ConfigError::InvalidValue(
                    "FEED_MODE".to_string(),
                    format!("must be live or synthetic, got {}", other),
                ))
            }
        };

        let search_api_url = env_map
            .get("SEARCH_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Config {
            port,
            database_path,
            binance_api_url,
            binance_ws_url,
            jwt_secret,
            token_ttl_hours,
            starting_cash,
            feed_mode,
            search_api_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "JWT_SECRET".to_string(),
            "a-very-secret-test-key".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.binance_api_url, "https://api.binance.com");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.feed_mode, FeedMode::Live);
        assert_eq!(config.starting_cash.to_canonical_string(), "10000");
        assert!(config.search_api_url.is_none());
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_jwt_secret() {
        let mut env_map = setup_required_env();
        env_map.remove("JWT_SECRET");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "JWT_SECRET"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("JWT_SECRET".to_string(), "short".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "JWT_SECRET"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_feed_mode() {
        let mut env_map = setup_required_env();
        env_map.insert("FEED_MODE".to_string(), "replay".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "FEED_MODE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_negative_starting_cash_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("STARTING_CASH".to_string(), "-5".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "STARTING_CASH"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_blank_search_url_treated_as_unset() {
        let mut env_map = setup_required_env();
        env_map.insert("SEARCH_API_URL".to_string(), "  ".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.search_api_url.is_none());
    }
}
