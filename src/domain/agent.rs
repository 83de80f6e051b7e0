//! Trading-agent rows: Agent, personality, reports, chat messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TimeMs;

/// Agent personality, which shapes signal thresholds and reply tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Conservative,
    Balanced,
    Aggressive,
}

impl Personality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Conservative => "conservative",
            Personality::Balanced => "balanced",
            Personality::Aggressive => "aggressive",
        }
    }

    /// Default RSI trigger levels for this personality. Conservative agents
    /// wait for deeper extremes before acting; aggressive agents act sooner.
    pub fn default_thresholds(&self) -> Thresholds {
        match self {
            Personality::Conservative => Thresholds {
                rsi_oversold: 25.0,
                rsi_overbought: 75.0,
                min_confidence: 0.6,
            },
            Personality::Balanced => Thresholds {
                rsi_oversold: 30.0,
                rsi_overbought: 70.0,
                min_confidence: 0.5,
            },
            Personality::Aggressive => Thresholds {
                rsi_oversold: 35.0,
                rsi_overbought: 65.0,
                min_confidence: 0.4,
            },
        }
    }
}

impl std::str::FromStr for Personality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Personality::Conservative),
            "balanced" => Ok(Personality::Balanced),
            "aggressive" => Ok(Personality::Aggressive),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-agent signal thresholds. Seeded from the personality defaults at
/// creation so later tuning is isolated to that agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub min_confidence: f64,
}

/// A named trading-agent personality row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub personality: Personality,
    pub thresholds: Thresholds,
    pub created_at: TimeMs,
}

/// Agent verdict over a signal snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "buy",
            Recommendation::Sell => "sell",
            Recommendation::Hold => "hold",
        }
    }
}

impl std::str::FromStr for Recommendation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Recommendation::Buy),
            "sell" => Ok(Recommendation::Sell),
            "hold" => Ok(Recommendation::Hold),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored snapshot of an agent's recommendation plus the price data it was
/// generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub symbol: super::Symbol,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub body: String,
    /// Closing price at generation time.
    pub price: super::Decimal,
    pub created_at: TimeMs,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Agent => "agent",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "agent" => Ok(ChatRole::Agent),
            _ => Err(()),
        }
    }
}

/// A persisted chat message, either the user's prompt or the agent's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub agent_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: TimeMs,
}
