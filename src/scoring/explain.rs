//! Score Explainer
//!
//! Turns an already-computed [`Ltp2Score`] into an audit record: one
//! templated reason per component plus a timestamped copy of the inputs.
//! Nothing here recomputes or adjusts a score; every number is read from the
//! score it was given. Consumers (coaching, UI) use the text verbatim.

use crate::scoring::math::percent_distance;
use crate::types::{Direction, Grade, Ltp2Score, MarketContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scored components, in breakdown order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Component {
    Cloud,
    Vwap,
    GammaWall,
    GammaRegime,
    Patience,
    ResistancePenalty,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Cloud => write!(f, "EMA Cloud"),
            Component::Vwap => write!(f, "VWAP"),
            Component::GammaWall => write!(f, "Gamma Wall"),
            Component::GammaRegime => write!(f, "Gamma Regime"),
            Component::Patience => write!(f, "Patience Candle"),
            Component::ResistancePenalty => write!(f, "Opposing Wall"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentExplanation {
    pub component: Component,
    pub points: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreExplanation {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub score: f64,
    pub grade: Grade,
    pub direction: Direction,
    pub confidence: f64,
    pub summary: String,
    pub components: Vec<ComponentExplanation>,
    pub warnings: Vec<String>,
    pub recommendation: String,
    /// Raw inputs as scored
    pub inputs: MarketContext,
}

impl ScoreExplanation {
    pub fn component(&self, component: Component) -> Option<&ComponentExplanation> {
        self.components.iter().find(|c| c.component == component)
    }
}

/// Explain `score` with the current wall-clock time
pub fn explain_score(symbol: &str, ctx: &MarketContext, score: &Ltp2Score) -> ScoreExplanation {
    explain_score_at(symbol, ctx, score, Utc::now())
}

/// Explain `score`, stamping it with `at`
pub fn explain_score_at(
    symbol: &str,
    ctx: &MarketContext,
    score: &Ltp2Score,
    at: DateTime<Utc>,
) -> ScoreExplanation {
    let b = &score.breakdown;
    let direction = score.direction;

    let components = vec![
        ComponentExplanation {
            component: Component::Cloud,
            points: b.cloud,
            reason: cloud_reason(ctx, direction, b.cloud),
        },
        ComponentExplanation {
            component: Component::Vwap,
            points: b.vwap,
            reason: vwap_reason(ctx, direction, b.vwap),
        },
        ComponentExplanation {
            component: Component::GammaWall,
            points: b.gamma_wall,
            reason: wall_reason(ctx, direction, b.gamma_wall),
        },
        ComponentExplanation {
            component: Component::GammaRegime,
            points: b.gamma_regime,
            reason: regime_reason(ctx, b.gamma_regime),
        },
        ComponentExplanation {
            component: Component::Patience,
            points: b.patience,
            reason: patience_reason(ctx, b.patience),
        },
        ComponentExplanation {
            component: Component::ResistancePenalty,
            points: b.resistance_penalty,
            reason: penalty_reason(ctx, direction, b.resistance_penalty),
        },
    ];

    let summary = format!(
        "{} {} scored {:.0} ({}) with {:.0}% confidence",
        symbol, direction, score.score, score.grade, score.confidence
    );

    ScoreExplanation {
        symbol: symbol.to_string(),
        generated_at: at,
        score: score.score,
        grade: score.grade,
        direction,
        confidence: score.confidence,
        summary,
        components,
        warnings: score.warnings.iter().map(|w| w.to_string()).collect(),
        recommendation: score.recommendation.clone(),
        inputs: ctx.clone(),
    }
}

fn cloud_reason(ctx: &MarketContext, direction: Direction, points: f64) -> String {
    let spread = percent_distance(ctx.ema8, ctx.ema21);
    format!(
        "EMA8 {:.2} vs EMA21 {:.2} ({:+.2}% spread) reads {} - {:.0} pts",
        ctx.ema8, ctx.ema21, spread, direction, points
    )
}

fn vwap_reason(ctx: &MarketContext, direction: Direction, points: f64) -> String {
    let distance = percent_distance(ctx.current_price, ctx.vwap);
    let side = if distance >= 0.0 { "above" } else { "below" };
    format!(
        "Price {:.2} is {:.2}% {} VWAP {:.2} for a {} trade - {:.0} pts",
        ctx.current_price,
        distance.abs(),
        side,
        ctx.vwap,
        direction,
        points
    )
}

fn wall_reason(ctx: &MarketContext, direction: Direction, points: f64) -> String {
    let (name, wall) = match direction {
        Direction::Bullish => ("put wall", ctx.put_wall),
        Direction::Bearish => ("call wall", ctx.call_wall),
    };
    match wall {
        Some(wall) => format!(
            "Price {:.2} vs {} {:.2} - {:.0} pts",
            ctx.current_price, name, wall, points
        ),
        None => format!("No {} available - {:.0} pts", name, points),
    }
}

fn regime_reason(ctx: &MarketContext, points: f64) -> String {
    match (ctx.gamma_exposure, ctx.zero_gamma) {
        (Some(gex), _) => format!("Net gamma exposure {:.0} - {:.0} pts", gex, points),
        (None, Some(flip)) => format!(
            "Price {:.2} vs zero gamma {:.2} - {:.0} pts",
            ctx.current_price, flip, points
        ),
        (None, None) => format!("No gamma exposure data - {:.0} pts", points),
    }
}

fn patience_reason(ctx: &MarketContext, points: f64) -> String {
    match (ctx.current_bar.as_ref(), ctx.previous_bar.as_ref()) {
        (Some(current), Some(previous)) => format!(
            "Bar {:.2}-{:.2} inside prior {:.2}-{:.2}: {} - {:.0} pts",
            current.low,
            current.high,
            previous.low,
            previous.high,
            if current.high < previous.high && current.low > previous.low {
                "yes"
            } else {
                "no"
            },
            points
        ),
        _ => match ctx.patience_direction.filter(|_| ctx.patience_detected) {
            Some(flagged) => format!("Patience flag set ({}) - {:.0} pts", flagged, points),
            None => format!("No patience candle - {:.0} pts", points),
        },
    }
}

fn penalty_reason(ctx: &MarketContext, direction: Direction, points: f64) -> String {
    let (name, wall) = match direction {
        Direction::Bullish => ("call wall", ctx.call_wall),
        Direction::Bearish => ("put wall", ctx.put_wall),
    };
    match wall {
        Some(wall) => format!(
            "Opposing {} {:.2} is {:.2}% away - {:+.0} pts",
            name,
            wall,
            percent_distance(wall, ctx.current_price).abs(),
            points
        ),
        None => format!("No opposing {} - {:+.0} pts", name, points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::scoring::confluence::calculate_ltp2_score;
    use chrono::TimeZone;

    fn context() -> MarketContext {
        MarketContext {
            current_price: 101.0,
            previous_close: 100.0,
            ema8: 100.6,
            ema21: 100.0,
            vwap: 100.5,
            call_wall: Some(105.0),
            put_wall: Some(98.0),
            zero_gamma: None,
            gamma_exposure: Some(50_000.0),
            patience_detected: true,
            patience_direction: Some(Direction::Bullish),
            previous_bar: None,
            current_bar: None,
        }
    }

    #[test]
    fn test_explanation_mirrors_score() {
        let ctx = context();
        let score = calculate_ltp2_score(&ctx, None, &ScoringConfig::default()).score;
        let at = Utc.with_ymd_and_hms(2025, 9, 15, 14, 30, 0).unwrap();
        let explanation = explain_score_at("SPY", &ctx, &score, at);

        assert_eq!(explanation.generated_at, at);
        assert_eq!(explanation.score, score.score);
        assert_eq!(explanation.grade, score.grade);
        assert_eq!(explanation.confidence, score.confidence);
        assert_eq!(explanation.components.len(), 6);
        assert_eq!(explanation.component(Component::Vwap).unwrap().points, 18.0);
        assert_eq!(explanation.inputs, ctx);
        assert_eq!(explanation.recommendation, score.recommendation);
        assert!(explanation.summary.starts_with("SPY bullish scored 88 (Sniper)"));
    }

    #[test]
    fn test_explainer_does_not_recompute() {
        // A tampered score is reported as given
        let ctx = context();
        let mut score = calculate_ltp2_score(&ctx, None, &ScoringConfig::default()).score;
        score.score = 12.0;
        score.breakdown.cloud = 3.0;
        score.grade = Grade::DumbShit;

        let explanation = explain_score("SPY", &ctx, &score);
        assert_eq!(explanation.score, 12.0);
        assert_eq!(explanation.grade, Grade::DumbShit);
        assert_eq!(explanation.component(Component::Cloud).unwrap().points, 3.0);
        assert!(explanation.component(Component::Cloud).unwrap().reason.ends_with("3 pts"));
    }

    #[test]
    fn test_reasons_handle_missing_data() {
        let mut ctx = context();
        ctx.put_wall = None;
        ctx.gamma_exposure = None;
        ctx.patience_detected = false;
        let score = calculate_ltp2_score(&ctx, None, &ScoringConfig::default()).score;
        let explanation = explain_score("QQQ", &ctx, &score);
        assert!(explanation.component(Component::GammaWall).unwrap().reason.starts_with("No put wall"));
        assert!(explanation.component(Component::GammaRegime).unwrap().reason.starts_with("No gamma"));
        assert!(explanation.component(Component::Patience).unwrap().reason.starts_with("No patience"));
        assert!(!explanation.warnings.is_empty());
    }
}
