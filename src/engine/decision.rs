//! Deterministic decision table over a signal snapshot.

use crate::domain::{Recommendation, Thresholds};

use super::SignalSnapshot;

/// Outcome of evaluating an agent's thresholds against a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub recommendation: Recommendation,
    /// Share of available signals agreeing with the recommendation, in [0, 1].
    pub confidence: f64,
    /// Human-readable justification per contributing signal.
    pub reasons: Vec<String>,
}

/// Evaluate the fixed threshold table.
///
/// Each available signal votes bullish, bearish, or abstains. The dominant
/// side wins if its share of available signals reaches the agent's
/// `min_confidence`; otherwise the verdict is Hold.
pub fn decide(thresholds: &Thresholds, snapshot: &SignalSnapshot) -> Decision {
    let mut bull = 0usize;
    let mut bear = 0usize;
    let mut reasons = Vec::new();

    if let Some(rsi) = snapshot.rsi {
        if rsi <= thresholds.rsi_oversold {
            bull += 1;
            reasons.push(format!(
                "RSI {:.1} is at or below the oversold level {:.0}",
                rsi, thresholds.rsi_oversold
            ));
        } else if rsi >= thresholds.rsi_overbought {
            bear += 1;
            reasons.push(format!(
                "RSI {:.1} is at or above the overbought level {:.0}",
                rsi, thresholds.rsi_overbought
            ));
        }
    }

    if let Some(hist) = snapshot.macd_histogram {
        if hist > 0.0 {
            bull += 1;
            reasons.push(format!("MACD histogram is positive ({:.2})", hist));
        } else if hist < 0.0 {
            bear += 1;
            reasons.push(format!("MACD histogram is negative ({:.2})", hist));
        }
    }

    if let (Some(fast), Some(slow)) = (snapshot.sma_fast, snapshot.sma_slow) {
        if fast > slow {
            bull += 1;
            reasons.push(format!(
                "fast SMA {:.2} is above slow SMA {:.2}",
                fast, slow
            ));
        } else if fast < slow {
            bear += 1;
            reasons.push(format!(
                "fast SMA {:.2} is below slow SMA {:.2}",
                fast, slow
            ));
        }
    }

    if let Some(pb) = snapshot.percent_b {
        if pb <= 0.05 {
            bull += 1;
            reasons.push("price is pinned to the lower Bollinger band".to_string());
        } else if pb >= 0.95 {
            bear += 1;
            reasons.push("price is pinned to the upper Bollinger band".to_string());
        }
    }

    let available = snapshot.available();
    if available == 0 {
        return Decision {
            recommendation: Recommendation::Hold,
            confidence: 0.0,
            reasons: vec!["not enough price history to evaluate signals".to_string()],
        };
    }

    let (recommendation, winning) = if bull > bear {
        (Recommendation::Buy, bull)
    } else if bear > bull {
        (Recommendation::Sell, bear)
    } else {
        (Recommendation::Hold, 0)
    };

    let confidence = winning as f64 / available as f64;

    if recommendation == Recommendation::Hold || confidence < thresholds.min_confidence {
        if reasons.is_empty() {
            reasons.push("signals are mixed with no clear direction".to_string());
        }
        return Decision {
            recommendation: Recommendation::Hold,
            confidence,
            reasons,
        };
    }

    Decision {
        recommendation,
        confidence,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Personality;

    fn thresholds() -> Thresholds {
        Personality::Balanced.default_thresholds()
    }

    fn snapshot() -> SignalSnapshot {
        SignalSnapshot {
            price: 60_000.0,
            rsi: Some(50.0),
            macd_histogram: Some(0.0),
            sma_fast: Some(60_000.0),
            sma_slow: Some(60_000.0),
            percent_b: Some(0.5),
        }
    }

    #[test]
    fn test_oversold_momentum_buy() {
        let mut s = snapshot();
        s.rsi = Some(25.0);
        s.macd_histogram = Some(12.0);
        s.sma_fast = Some(60_500.0);

        let d = decide(&thresholds(), &s);
        assert_eq!(d.recommendation, Recommendation::Buy);
        assert!((d.confidence - 0.75).abs() < 1e-9);
        assert_eq!(d.reasons.len(), 3);
    }

    #[test]
    fn test_overbought_sell() {
        let mut s = snapshot();
        s.rsi = Some(80.0);
        s.macd_histogram = Some(-5.0);
        s.percent_b = Some(0.99);

        let d = decide(&thresholds(), &s);
        assert_eq!(d.recommendation, Recommendation::Sell);
        assert!(d.confidence >= 0.5);
    }

    #[test]
    fn test_neutral_holds() {
        let d = decide(&thresholds(), &snapshot());
        assert_eq!(d.recommendation, Recommendation::Hold);
        assert_eq!(d.confidence, 0.0);
        assert!(!d.reasons.is_empty());
    }

    #[test]
    fn test_weak_majority_below_min_confidence_holds() {
        let mut s = snapshot();
        // One bullish vote out of four available signals: 0.25 < 0.5.
        s.macd_histogram = Some(3.0);

        let d = decide(&thresholds(), &s);
        assert_eq!(d.recommendation, Recommendation::Hold);
        assert!((d.confidence - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_aggressive_acts_where_conservative_holds() {
        let mut s = snapshot();
        s.rsi = Some(33.0);
        s.macd_histogram = Some(1.0);

        // rsi 33 triggers the aggressive oversold level (35) but not the
        // conservative one (25): aggressive sees 2/4 votes, conservative 1/4.
        let aggressive = decide(&Personality::Aggressive.default_thresholds(), &s);
        assert_eq!(aggressive.recommendation, Recommendation::Buy);

        let conservative = decide(&Personality::Conservative.default_thresholds(), &s);
        assert_eq!(conservative.recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_no_signals_holds_with_zero_confidence() {
        let s = SignalSnapshot {
            price: 100.0,
            ..Default::default()
        };
        let d = decide(&thresholds(), &s);
        assert_eq!(d.recommendation, Recommendation::Hold);
        assert_eq!(d.confidence, 0.0);
    }

    #[test]
    fn test_tie_holds() {
        let mut s = snapshot();
        s.rsi = Some(20.0);
        s.macd_histogram = Some(-4.0);

        let d = decide(&thresholds(), &s);
        assert_eq!(d.recommendation, Recommendation::Hold);
    }
}
