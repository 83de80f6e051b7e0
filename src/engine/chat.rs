//! Keyword command parser and canned chat replies.

use crate::domain::{Decimal, Personality};

use super::Decision;

/// What the user is asking for, derived from keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Price,
    Portfolio,
    Indicators,
    News,
    Advice,
    Help,
    Unknown,
}

/// Pick an intent from free-form message text.
///
/// First match wins, in priority order; greetings only count when the
/// message carries no other request.
pub fn parse_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["help", "what can you do", "commands"]) {
        Intent::Help
    } else if has(&["should i", "advice", "recommend", "buy or sell", "what do you think"]) {
        Intent::Advice
    } else if has(&["price", "how much", "worth", "quote"]) {
        Intent::Price
    } else if has(&["portfolio", "balance", "holdings", "my cash"]) {
        Intent::Portfolio
    } else if has(&["rsi", "macd", "indicator", "signal", "bollinger", "moving average"]) {
        Intent::Indicators
    } else if has(&["news", "sentiment", "headlines"]) {
        Intent::News
    } else if has(&["hello", "hi ", "hey"]) || lower.trim() == "hi" {
        Intent::Greeting
    } else {
        Intent::Unknown
    }
}

/// Aggregated news figures for the reply templates.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsDigest {
    pub label: String,
    pub average: f64,
    pub count: i64,
}

/// Everything a reply template may reference. Handlers fill in what they
/// could gather; templates degrade gracefully on `None`.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub price: Option<Decimal>,
    pub cash: Option<Decimal>,
    pub btc_qty: Option<Decimal>,
    pub portfolio_value: Option<Decimal>,
    pub rsi: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub decision: Option<Decision>,
    pub news: Option<NewsDigest>,
}

/// Render the canned reply for an intent.
pub fn render_reply(personality: Personality, intent: Intent, ctx: &ChatContext) -> String {
    match intent {
        Intent::Greeting => greeting(personality).to_string(),
        Intent::Help => {
            "You can ask me about the BTC price, your portfolio, technical indicators, \
             market news, or whether to buy or sell."
                .to_string()
        }
        Intent::Price => match ctx.price {
            Some(price) => format!("BTC is trading at {} right now.", price.round_dp(2)),
            None => "I do not have a live price at the moment; try again shortly.".to_string(),
        },
        Intent::Portfolio => match (ctx.cash, ctx.btc_qty, ctx.portfolio_value) {
            (Some(cash), Some(qty), Some(value)) => format!(
                "You hold {} BTC and {} in cash, worth {} in total.",
                qty,
                cash.round_dp(2),
                value.round_dp(2)
            ),
            _ => "I could not load your portfolio.".to_string(),
        },
        Intent::Indicators => {
            let mut parts = Vec::new();
            if let Some(rsi) = ctx.rsi {
                parts.push(format!("RSI is {:.1}", rsi));
            }
            if let Some(hist) = ctx.macd_histogram {
                parts.push(format!(
                    "the MACD histogram is {}",
                    if hist > 0.0 { "positive" } else { "negative" }
                ));
            }
            if parts.is_empty() {
                "Not enough price history to compute indicators yet.".to_string()
            } else {
                format!("{}.", parts.join(" and "))
            }
        }
        Intent::News => match &ctx.news {
            Some(digest) if digest.count > 0 => format!(
                "Across {} recent articles the mood is {} (average score {:.2}).",
                digest.count, digest.label, digest.average
            ),
            _ => "No recent news on file.".to_string(),
        },
        Intent::Advice => match &ctx.decision {
            Some(decision) => format!(
                "My read is {} with {:.0}% confidence. {}",
                decision.recommendation.as_str().to_uppercase(),
                decision.confidence * 100.0,
                advice_flavor(personality)
            ),
            None => "I need more price history before giving a recommendation.".to_string(),
        },
        Intent::Unknown => {
            "I did not catch that. Ask me about price, portfolio, indicators, news, or advice."
                .to_string()
        }
    }
}

fn greeting(personality: Personality) -> &'static str {
    match personality {
        Personality::Conservative => {
            "Hello. I keep things careful here; ask me about price, portfolio, or advice."
        }
        Personality::Balanced => "Hi there. Ask me about the market or your portfolio.",
        Personality::Aggressive => "Hey! Ready to hunt for the next move? Ask away.",
    }
}

fn advice_flavor(personality: Personality) -> &'static str {
    match personality {
        Personality::Conservative => "Size conservatively either way.",
        Personality::Balanced => "Weigh it against your own risk tolerance.",
        Personality::Aggressive => "If you act, act decisively.",
    }
}
