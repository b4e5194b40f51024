//! LTP 2.0 Confluence Aggregator
//!
//! Combines the graduated component scorers into a single evaluation:
//!
//! | Component       | Max | Source                         |
//! |-----------------|-----|--------------------------------|
//! | EMA cloud       | 25  | spread of ema8 vs ema21        |
//! | VWAP            | 20  | distance and side of VWAP      |
//! | Gamma wall      | 20  | price vs the supportive wall   |
//! | Gamma regime    | 15  | exposure sign                  |
//! | Patience candle | 10  | inside bar quality             |
//! | Opposing wall   | -20 | distance to the wall in the way|
//!
//! The cloud picks the direction; every other component is scored for it.
//! The raw total is clamped to 0-90, then graded through hysteresis.

use crate::config::{ScoringConfig, WeightsConfig};
use crate::scoring::gamma::{calculate_opposing_wall_penalty, score_gamma_regime, score_gamma_wall_position};
use crate::scoring::hysteresis::apply_hysteresis;
use crate::scoring::math::{clamp_score, safe_divide};
use crate::scoring::patience::score_patience;
use crate::scoring::trend::{score_ema_cloud, CloudStrength};
use crate::scoring::vwap::score_vwap;
use crate::types::{
    Direction, Grade, Ltp2Score, MarketContext, ScoreBreakdown, ScoreHysteresisState, ScoreStability,
    ScoreWarning, Severity,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Confidence share of each component, in percent
const CLOUD_CONFIDENCE: f64 = 30.0;
const VWAP_CONFIDENCE: f64 = 25.0;
const GAMMA_WALL_CONFIDENCE: f64 = 20.0;
const GAMMA_REGIME_CONFIDENCE: f64 = 15.0;
const PATIENCE_CONFIDENCE: f64 = 10.0;

/// A score together with the state the caller should store for next time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvaluation {
    pub score: Ltp2Score,
    pub next_state: ScoreHysteresisState,
}

/// Score a context.
///
/// `previous_state` is the caller's stored hysteresis state for this symbol,
/// if any. `stability` is only populated when it was supplied.
pub fn calculate_ltp2_score(
    ctx: &MarketContext,
    previous_state: Option<&ScoreHysteresisState>,
    config: &ScoringConfig,
) -> ScoreEvaluation {
    let w = &config.weights;
    let price = ctx.current_price;

    let cloud = score_ema_cloud(ctx.ema8, ctx.ema21, price, ctx.vwap, w.cloud, &config.cloud);
    let direction = cloud.direction;

    let vwap = score_vwap(price, ctx.vwap, direction, w.vwap, &config.vwap);
    let wall = score_gamma_wall_position(price, ctx.call_wall, ctx.put_wall, direction, w.gamma_wall);
    let regime = score_gamma_regime(ctx.gamma_exposure, ctx.zero_gamma, price, direction, w.gamma_regime);
    let patience = score_patience(ctx, direction, w.patience, &config.patience);
    let penalty = calculate_opposing_wall_penalty(
        price,
        ctx.call_wall,
        ctx.put_wall,
        direction,
        w.max_penalty,
        &config.gamma,
    );

    let mut breakdown = ScoreBreakdown {
        cloud: cloud.score,
        vwap: vwap.score,
        gamma_wall: wall.score,
        gamma_regime: regime.score,
        patience: patience.score,
        resistance_penalty: penalty.penalty,
        total: 0.0,
    };
    breakdown.total = clamp_score(breakdown.component_sum(), 0.0, w.max_total);

    let mut warnings = Vec::new();
    if cloud.strength == CloudStrength::Neutral {
        warnings.push(ScoreWarning::new(
            Severity::Low,
            format!(
                "EMA cloud is flat ({:+.2}% spread) - direction taken from VWAP",
                cloud.spread_pct
            ),
        ));
    }
    warnings.extend(
        [vwap.warning, wall.warning, regime.warning, penalty.warning]
            .into_iter()
            .flatten(),
    );

    let hysteresis = apply_hysteresis(breakdown.total, previous_state, &config.grades);
    let grade = hysteresis.grade;
    let confidence = calculate_confidence(&breakdown, w);
    let recommendation = build_recommendation(grade, direction, &warnings);

    debug!(
        "LTP2 {} {}: total={} (cloud {} vwap {} wall {} regime {} patience {} penalty {}) confidence={}",
        direction,
        grade,
        breakdown.total,
        breakdown.cloud,
        breakdown.vwap,
        breakdown.gamma_wall,
        breakdown.gamma_regime,
        breakdown.patience,
        breakdown.resistance_penalty,
        confidence
    );

    let stability = previous_state.map(|_| ScoreStability {
        raw_score: breakdown.total,
        smoothed_score: hysteresis.smoothed_score,
        grade_locked: hysteresis.grade_locked,
        candles_at_grade: hysteresis.candles_at_grade,
        previous_grade: hysteresis.previous_grade,
    });

    ScoreEvaluation {
        score: Ltp2Score {
            score: breakdown.total,
            grade,
            direction,
            confidence,
            breakdown,
            warnings,
            recommendation,
            stability,
        },
        next_state: hysteresis.next_state,
    }
}

/// Weighted share of each component's max, rounded, capped at 100
pub fn calculate_confidence(breakdown: &ScoreBreakdown, weights: &WeightsConfig) -> f64 {
    let parts = [
        (breakdown.cloud, weights.cloud, CLOUD_CONFIDENCE),
        (breakdown.vwap, weights.vwap, VWAP_CONFIDENCE),
        (breakdown.gamma_wall, weights.gamma_wall, GAMMA_WALL_CONFIDENCE),
        (breakdown.gamma_regime, weights.gamma_regime, GAMMA_REGIME_CONFIDENCE),
        (breakdown.patience, weights.patience, PATIENCE_CONFIDENCE),
    ];

    let confidence: f64 = parts
        .iter()
        .map(|(points, max, share)| safe_divide(*points, *max) * share)
        .sum();

    clamp_score(confidence.round(), 0.0, 100.0)
}

/// Highest severity warning; the earliest one wins ties
pub fn strongest_warning(warnings: &[ScoreWarning]) -> Option<&ScoreWarning> {
    warnings.iter().fold(None, |best: Option<&ScoreWarning>, w| match best {
        Some(b) if b.severity >= w.severity => Some(b),
        _ => Some(w),
    })
}

/// Grade template, plus the strongest warning when there is one
pub fn build_recommendation(grade: Grade, direction: Direction, warnings: &[ScoreWarning]) -> String {
    let base = match grade {
        Grade::Sniper => format!(
            "Sniper {} setup - confluence is stacked, take the trade on the patience candle break",
            direction
        ),
        Grade::Decent => format!(
            "Decent {} setup - trade smaller or wait for the missing confluence",
            direction
        ),
        Grade::DumbShit => format!("Dumb Shit - no {} trade here, wait for a better setup", direction),
    };

    match strongest_warning(warnings) {
        Some(warning) => format!("{}. Watch out: {}", base, warning),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Random bar around `center`, usually nested inside `outer` when given
    fn random_bar(rng: &mut StdRng, center: f64, outer: Option<&Bar>) -> Bar {
        let (low, high) = match outer {
            Some(outer) if rng.gen_bool(0.6) => {
                let span = outer.range();
                let low = outer.low + span * rng.gen_range(0.0..0.4);
                (low, low + span * rng.gen_range(0.05..0.6))
            }
            _ => {
                let half = center * rng.gen_range(0.0005..0.01);
                let mid = center * (1.0 + rng.gen_range(-0.005..0.005));
                (mid - half, mid + half)
            }
        };
        let open = rng.gen_range(low..=high);
        let close = rng.gen_range(low..=high);
        Bar {
            open,
            high,
            low,
            close,
            volume: rng.gen_range(100.0..10_000.0),
            timestamp: Utc.with_ymd_and_hms(2025, 9, 15, 14, 0, 0).unwrap(),
        }
    }

    fn reference_context() -> MarketContext {
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
    fn test_reference_context_scores_sniper() {
        let eval = calculate_ltp2_score(&reference_context(), None, &ScoringConfig::default());
        let score = &eval.score;
        assert_eq!(score.direction, Direction::Bullish);
        assert_eq!(score.breakdown.cloud, 25.0);
        assert_eq!(score.breakdown.vwap, 18.0);
        assert_eq!(score.breakdown.gamma_wall, 20.0);
        assert_eq!(score.breakdown.gamma_regime, 15.0);
        assert_eq!(score.breakdown.patience, 10.0);
        assert_eq!(score.breakdown.resistance_penalty, 0.0);
        assert_eq!(score.score, 88.0);
        assert_eq!(score.grade, Grade::Sniper);
        assert_eq!(score.confidence, 98.0);
        assert!(score.warnings.is_empty());
        assert!(score.recommendation.starts_with("Sniper bullish"));
        assert!(score.stability.is_none());
        assert_eq!(eval.next_state.previous_scores, vec![88.0]);
    }

    #[test]
    fn test_deterministic() {
        let config = ScoringConfig::default();
        let a = calculate_ltp2_score(&reference_context(), None, &config);
        let b = calculate_ltp2_score(&reference_context(), None, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stability_only_with_state() {
        let config = ScoringConfig::default();
        let first = calculate_ltp2_score(&reference_context(), None, &config);
        let second = calculate_ltp2_score(&reference_context(), Some(&first.next_state), &config);
        let stability = second.score.stability.unwrap();
        assert_eq!(stability.raw_score, 88.0);
        assert_eq!(stability.smoothed_score, 88.0);
        assert_eq!(stability.candles_at_grade, 2);
        assert_eq!(stability.previous_grade, Some(Grade::Sniper));
        assert!(!stability.grade_locked);
    }

    #[test]
    fn test_near_wall_penalty_and_warning() {
        let mut ctx = reference_context();
        ctx.call_wall = Some(101.3);
        let eval = calculate_ltp2_score(&ctx, None, &ScoringConfig::default());
        // 0.297% from the call wall
        assert_eq!(eval.score.breakdown.resistance_penalty, -20.0);
        assert_eq!(eval.score.score, 68.0);
        assert_eq!(eval.score.grade, Grade::Decent);
        assert!(eval.score.recommendation.contains("Call wall"));
    }

    #[test]
    fn test_bearish_context() {
        let ctx = MarketContext {
            current_price: 99.0,
            previous_close: 100.0,
            ema8: 99.4,
            ema21: 100.0,
            vwap: 99.6,
            call_wall: Some(102.0),
            put_wall: Some(95.0),
            zero_gamma: None,
            gamma_exposure: Some(-25_000.0),
            patience_detected: false,
            patience_direction: None,
            previous_bar: None,
            current_bar: None,
        };
        let eval = calculate_ltp2_score(&ctx, None, &ScoringConfig::default());
        assert_eq!(eval.score.direction, Direction::Bearish);
        assert_eq!(eval.score.breakdown.gamma_regime, 15.0);
        assert_eq!(eval.score.breakdown.gamma_wall, 20.0);
        assert_eq!(eval.score.breakdown.patience, 0.0);
    }

    #[test]
    fn test_strongest_warning_prefers_first_on_tie() {
        let warnings = vec![
            ScoreWarning::new(Severity::Low, "a"),
            ScoreWarning::new(Severity::High, "b"),
            ScoreWarning::new(Severity::High, "c"),
        ];
        assert_eq!(strongest_warning(&warnings).unwrap().message, "b");
        assert!(strongest_warning(&[]).is_none());
    }

    #[test]
    fn test_random_contexts_stay_in_bounds() {
        let config = ScoringConfig::default();
        let w = &config.weights;
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let price = rng.gen_range(10.0..500.0);
            let jitter = |rng: &mut StdRng| price * (1.0 + rng.gen_range(-0.03..0.03));
            let previous_bar = rng.gen_bool(0.7).then(|| random_bar(&mut rng, price, None));
            let current_bar = match &previous_bar {
                Some(outer) if rng.gen_bool(0.9) => Some(random_bar(&mut rng, price, Some(outer))),
                _ => None,
            };
            let ctx = MarketContext {
                current_price: price,
                previous_close: jitter(&mut rng),
                ema8: jitter(&mut rng),
                ema21: jitter(&mut rng),
                vwap: jitter(&mut rng),
                call_wall: rng.gen_bool(0.8).then(|| jitter(&mut rng)),
                put_wall: rng.gen_bool(0.8).then(|| jitter(&mut rng)),
                zero_gamma: rng.gen_bool(0.5).then(|| jitter(&mut rng)),
                gamma_exposure: rng.gen_bool(0.7).then(|| rng.gen_range(-1e6..1e6)),
                patience_detected: rng.gen_bool(0.5),
                patience_direction: Some(if rng.gen_bool(0.5) { Direction::Bullish } else { Direction::Bearish }),
                previous_bar,
                current_bar,
            };

            let s = calculate_ltp2_score(&ctx, None, &config).score;
            let b = &s.breakdown;
            assert!((0.0..=w.max_total).contains(&s.score));
            assert!((0.0..=w.cloud).contains(&b.cloud));
            assert!((0.0..=w.vwap).contains(&b.vwap));
            assert!((0.0..=w.gamma_wall).contains(&b.gamma_wall));
            assert!((0.0..=w.gamma_regime).contains(&b.gamma_regime));
            assert!((0.0..=w.patience).contains(&b.patience));
            assert!((-w.max_penalty..=0.0).contains(&b.resistance_penalty));
            assert!((0.0..=100.0).contains(&s.confidence));
        }
    }
}
