//! Scoring strategies
//!
//! Two independent scoring systems live side by side:
//! - `LtpV2Scorer`: graduated confluence score, Sniper / Decent / Dumb Shit
//! - `LegacyV1Scorer`: weighted level / trend / patience average, A-F
//!
//! They share the request shape but not their semantics. Neither result is
//! translated into the other's scale.

use crate::config::ScoringConfig;
use crate::scoring::confluence::{calculate_ltp2_score, ScoreEvaluation};
use crate::scoring::legacy::{calculate_legacy_score, level_proximity_score, LegacyScore};
use crate::scoring::levels::nearest_level;
use crate::scoring::math::safe_divide;
use crate::scoring::patience::score_patience;
use crate::scoring::trend::{score_ema_cloud, score_trend_alignment};
use crate::types::{Direction, KeyLevel, MarketContext, MtfAnalysis, ScoreHysteresisState};
use serde::{Deserialize, Serialize};

/// Named scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    LtpV2,
    LegacyV1,
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringStrategy::LtpV2 => write!(f, "ltp-v2"),
            ScoringStrategy::LegacyV1 => write!(f, "legacy-v1"),
        }
    }
}

impl std::str::FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ltp-v2" | "v2" => Ok(ScoringStrategy::LtpV2),
            "legacy-v1" | "legacy" | "v1" => Ok(ScoringStrategy::LegacyV1),
            other => Err(format!("Unknown scoring strategy: {}", other)),
        }
    }
}

/// Everything a scorer may look at for one symbol
#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest<'a> {
    pub symbol: &'a str,
    pub context: &'a MarketContext,
    pub levels: &'a [KeyLevel],
    pub mtf: &'a [MtfAnalysis],
    /// Caller-owned hysteresis state; ignored by the legacy scorer
    pub previous_state: Option<&'a ScoreHysteresisState>,
}

/// Result of a strategy, in that strategy's own terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum StrategyScore {
    LtpV2(ScoreEvaluation),
    LegacyV1(LegacyScore),
}

impl StrategyScore {
    /// Numeric score on the strategy's own scale (0-90 for v2, 0-100 for v1)
    pub fn value(&self) -> f64 {
        match self {
            StrategyScore::LtpV2(eval) => eval.score.score,
            StrategyScore::LegacyV1(score) => score.overall,
        }
    }

    /// Grade label on the strategy's own scale
    pub fn label(&self) -> String {
        match self {
            StrategyScore::LtpV2(eval) => eval.score.grade.to_string(),
            StrategyScore::LegacyV1(score) => score.grade.to_string(),
        }
    }
}

/// Core scorer trait - every scoring strategy implements this
pub trait Scorer: Send + Sync {
    /// Scorer name
    fn name(&self) -> &str;

    fn strategy(&self) -> ScoringStrategy;

    /// Score one request
    fn score(&self, request: &ScoreRequest<'_>) -> StrategyScore;
}

/// LTP 2.0 confluence scorer
#[derive(Debug, Clone)]
pub struct LtpV2Scorer {
    config: ScoringConfig,
}

impl LtpV2Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, request: &ScoreRequest<'_>) -> ScoreEvaluation {
        calculate_ltp2_score(request.context, request.previous_state, &self.config)
    }
}

impl Scorer for LtpV2Scorer {
    fn name(&self) -> &str {
        "LTP 2.0 Confluence"
    }

    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::LtpV2
    }

    fn score(&self, request: &ScoreRequest<'_>) -> StrategyScore {
        StrategyScore::LtpV2(self.evaluate(request))
    }
}

/// Inputs the legacy scorer derives from a request, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyInputs {
    pub direction: Direction,
    pub level: f64,
    pub trend: f64,
    pub patience: f64,
}

/// Derive level / trend / patience inputs for the direction the EMA cloud
/// points to.
pub fn derive_legacy_inputs(request: &ScoreRequest<'_>, config: &ScoringConfig) -> LegacyInputs {
    let ctx = request.context;
    let price = ctx.current_price;
    let direction = score_ema_cloud(ctx.ema8, ctx.ema21, price, ctx.vwap, config.weights.cloud, &config.cloud).direction;

    let level = level_proximity_score(nearest_level(request.levels, price, direction), price, &config.legacy);
    let trend = score_trend_alignment(request.mtf, direction, &config.trend);
    let patience_points = score_patience(ctx, direction, config.weights.patience, &config.patience).score;
    let patience = safe_divide(patience_points, config.weights.patience) * 100.0;

    LegacyInputs {
        direction,
        level,
        trend,
        patience,
    }
}

/// Legacy v1 weighted scorer
#[derive(Debug, Clone)]
pub struct LegacyV1Scorer {
    config: ScoringConfig,
}

impl LegacyV1Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, request: &ScoreRequest<'_>) -> LegacyScore {
        let inputs = derive_legacy_inputs(request, &self.config);
        calculate_legacy_score(inputs.level, inputs.trend, inputs.patience, &self.config.legacy)
    }
}

impl Scorer for LegacyV1Scorer {
    fn name(&self) -> &str {
        "Legacy v1 Weighted"
    }

    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::LegacyV1
    }

    fn score(&self, request: &ScoreRequest<'_>) -> StrategyScore {
        StrategyScore::LegacyV1(self.evaluate(request))
    }
}

/// Factory for scorers
pub struct ScorerFactory;

impl ScorerFactory {
    pub fn create(strategy: ScoringStrategy, config: ScoringConfig) -> Box<dyn Scorer> {
        match strategy {
            ScoringStrategy::LtpV2 => Box::new(LtpV2Scorer::new(config)),
            ScoringStrategy::LegacyV1 => Box::new(LegacyV1Scorer::new(config)),
        }
    }

    /// One scorer per strategy
    pub fn all(config: &ScoringConfig) -> Vec<Box<dyn Scorer>> {
        [ScoringStrategy::LtpV2, ScoringStrategy::LegacyV1]
            .into_iter()
            .map(|strategy| Self::create(strategy, config.clone()))
            .collect()
    }
}
