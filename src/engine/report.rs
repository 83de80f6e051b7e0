//! Canned analysis-report text, flavored by agent personality.

use crate::domain::{Personality, Recommendation, Symbol};

use super::{Decision, SignalSnapshot};

/// Render the stored report body for a decision.
pub fn render_report(
    personality: Personality,
    symbol: &Symbol,
    snapshot: &SignalSnapshot,
    decision: &Decision,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} at {:.2}. {}\n\n",
        symbol,
        snapshot.price,
        opening_line(personality)
    ));

    out.push_str("Signals:\n");
    for reason in &decision.reasons {
        out.push_str(&format!("- {}\n", reason));
    }

    out.push_str(&format!(
        "\nVerdict: {} (confidence {:.0}%). {}",
        decision.recommendation.as_str().to_uppercase(),
        decision.confidence * 100.0,
        closing_line(personality, decision.recommendation)
    ));

    out
}

fn opening_line(personality: Personality) -> &'static str {
    match personality {
        Personality::Conservative => {
            "Capital preservation comes first; I only act on strong, confirmed setups."
        }
        Personality::Balanced => "Weighing momentum against risk before committing either way.",
        Personality::Aggressive => "Scanning for momentum worth chasing while it lasts.",
    }
}

fn closing_line(personality: Personality, recommendation: Recommendation) -> &'static str {
    match (personality, recommendation) {
        (Personality::Conservative, Recommendation::Buy) => {
            "Consider a small position and a tight exit plan."
        }
        (Personality::Conservative, Recommendation::Sell) => {
            "Reducing exposure here protects the downside."
        }
        (Personality::Conservative, Recommendation::Hold) => {
            "No setup meets my bar; staying in cash costs nothing."
        }
        (Personality::Balanced, Recommendation::Buy) => {
            "The balance of signals favors adding exposure."
        }
        (Personality::Balanced, Recommendation::Sell) => {
            "The balance of signals favors trimming exposure."
        }
        (Personality::Balanced, Recommendation::Hold) => {
            "Signals are mixed; waiting for a cleaner read."
        }
        (Personality::Aggressive, Recommendation::Buy) => {
            "Momentum is here; size up while the trend holds."
        }
        (Personality::Aggressive, Recommendation::Sell) => {
            "Momentum has flipped; get out before the crowd does."
        }
        (Personality::Aggressive, Recommendation::Hold) => {
            "Nothing to chase yet; the next swing will come."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(rec: Recommendation) -> Decision {
        Decision {
            recommendation: rec,
            confidence: 0.75,
            reasons: vec!["RSI 25.0 is at or below the oversold level 30".to_string()],
        }
    }

    fn snapshot() -> SignalSnapshot {
        SignalSnapshot {
            price: 61_234.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_report_contains_symbol_price_and_verdict() {
        let body = render_report(
            Personality::Balanced,
            &Symbol::btcusdt(),
            &snapshot(),
            &decision(Recommendation::Buy),
        );
        assert!(body.contains("BTCUSDT"));
        assert!(body.contains("61234.50"));
        assert!(body.contains("BUY"));
        assert!(body.contains("75%"));
        assert!(body.contains("oversold"));
    }

    #[test]
    fn test_personality_changes_tone() {
        let conservative = render_report(
            Personality::Conservative,
            &Symbol::btcusdt(),
            &snapshot(),
            &decision(Recommendation::Hold),
        );
        let aggressive = render_report(
            Personality::Aggressive,
            &Symbol::btcusdt(),
            &snapshot(),
            &decision(Recommendation::Hold),
        );
        assert_ne!(conservative, aggressive);
        assert!(conservative.contains("Capital preservation"));
        assert!(aggressive.contains("momentum") || aggressive.contains("Momentum"));
    }
}
