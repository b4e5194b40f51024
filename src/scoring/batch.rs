//! Per-symbol evaluation and parallel batch scoring
//!
//! `evaluate_symbol` runs the whole pipeline for one symbol:
//! levels → trend → v2 score → trade plan → explanation → legacy score →
//! setup lifecycle. `score_batch` fans symbols out over rayon; each input
//! carries its own hysteresis state and setup, so nothing is shared.

use crate::config::ScoringConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::scoring::explain::{explain_score_at, ScoreExplanation};
use crate::scoring::legacy::LegacyScore;
use crate::scoring::levels::{identify_key_levels, nearest_level};
use crate::scoring::scorer::{LegacyV1Scorer, LtpV2Scorer, ScoreRequest};
use crate::scoring::setup::DetectedSetup;
use crate::scoring::trade_params::{calculate_trade_parameters, TradeParameters};
use crate::scoring::trend::{determine_trend, score_trend_alignment, TrendDirection};
use crate::types::{
    Bar, GammaSnapshot, KeyLevel, Ltp2Score, MarketContext, MtfAnalysis, ScoreHysteresisState,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_timeframe() -> String {
    "5m".to_string()
}

/// Everything known about one symbol at evaluation time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInput {
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Session bars, oldest first
    #[serde(default)]
    pub bars: Vec<Bar>,
    /// Explicit context; built from `bars` + `gamma` when absent
    #[serde(default)]
    pub context: Option<MarketContext>,
    #[serde(default)]
    pub gamma: GammaSnapshot,
    /// Precomputed levels; identified from `bars` when absent
    #[serde(default)]
    pub levels: Option<Vec<KeyLevel>>,
    #[serde(default)]
    pub mtf: Vec<MtfAnalysis>,
    #[serde(default)]
    pub previous_state: Option<ScoreHysteresisState>,
    #[serde(default)]
    pub active_setup: Option<DetectedSetup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolReport {
    pub symbol: String,
    pub levels: Vec<KeyLevel>,
    /// Structure of the supplied bars
    pub trend: TrendDirection,
    /// Multi-timeframe alignment with the scored direction, 0-100
    pub alignment: f64,
    pub score: Ltp2Score,
    /// Store this and pass it back as `previousState` next time
    pub next_state: ScoreHysteresisState,
    pub trade: Option<TradeParameters>,
    pub explanation: ScoreExplanation,
    pub legacy: LegacyScore,
    pub setup: Option<DetectedSetup>,
}

/// Both strategies, built once and shared across a batch
struct ReportScorers {
    ltp_v2: LtpV2Scorer,
    legacy_v1: LegacyV1Scorer,
}

impl ReportScorers {
    fn new(config: &ScoringConfig) -> Self {
        Self {
            ltp_v2: LtpV2Scorer::new(config.clone()),
            legacy_v1: LegacyV1Scorer::new(config.clone()),
        }
    }
}

/// Run the full pipeline for one symbol
pub fn evaluate_symbol(
    input: &SymbolInput,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> ScoringResult<SymbolReport> {
    evaluate_with(input, config, &ReportScorers::new(config), now)
}

fn evaluate_with(
    input: &SymbolInput,
    config: &ScoringConfig,
    scorers: &ReportScorers,
    now: DateTime<Utc>,
) -> ScoringResult<SymbolReport> {
    let ctx = match &input.context {
        Some(ctx) => ctx.clone(),
        None => MarketContext::from_bars(&input.bars, &input.gamma, &config.cloud).ok_or_else(|| {
            ScoringError::MissingContext {
                symbol: input.symbol.clone(),
                bars: input.bars.len(),
            }
        })?,
    };

    let levels = match &input.levels {
        Some(levels) => levels.clone(),
        None => identify_key_levels(&input.bars, &input.timeframe, &config.levels),
    };
    let trend = determine_trend(&input.bars, &config.trend);

    let request = ScoreRequest {
        symbol: &input.symbol,
        context: &ctx,
        levels: &levels,
        mtf: &input.mtf,
        previous_state: input.previous_state.as_ref(),
    };
    let evaluation = scorers.ltp_v2.evaluate(&request);
    let legacy = scorers.legacy_v1.evaluate(&request);
    let score = evaluation.score;
    let direction = score.direction;
    let price = ctx.current_price;

    let trade = calculate_trade_parameters(
        price,
        nearest_level(&levels, price, direction),
        direction,
        &config.trade,
    );
    let alignment = score_trend_alignment(&input.mtf, direction, &config.trend);
    let explanation = explain_score_at(&input.symbol, &ctx, &score, now);

    // A finished setup no longer blocks a new one
    let setup = match &input.active_setup {
        Some(active) if !active.stage.is_terminal() => Some(active.advance(&score, price, now, &config.setup)),
        _ => DetectedSetup::detect(&input.symbol, &score, trade.as_ref(), now, &config.setup),
    };

    debug!(
        "{}: {} levels, trend {}, alignment {:.0}, legacy {} ({:.1})",
        input.symbol,
        levels.len(),
        trend,
        alignment,
        legacy.grade,
        legacy.overall
    );

    Ok(SymbolReport {
        symbol: input.symbol.clone(),
        levels,
        trend,
        alignment,
        score,
        next_state: evaluation.next_state,
        trade,
        explanation,
        legacy,
        setup,
    })
}

/// Evaluate symbols in parallel. Results keep the input order.
pub fn score_batch(
    inputs: &[SymbolInput],
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> Vec<ScoringResult<SymbolReport>> {
    let scorers = ReportScorers::new(config);
    inputs
        .par_iter()
        .map(|input| {
            let result = evaluate_with(input, config, &scorers, now);
            if let Ok(ref report) = result {
                info!(
                    "Scored {}: {} {} ({:.0}, confidence {:.0})",
                    report.symbol,
                    report.score.direction,
                    report.score.grade,
                    report.score.score,
                    report.score.confidence
                );
            }
            result
        })
        .collect()
}
