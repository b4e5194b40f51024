//! Scoring Core - LTP setup evaluation
//!
//! This module contains the scoring components:
//! - Numeric guards (safe division, clamping)
//! - Key level identification from swing clusters
//! - Trend classification and multi-timeframe alignment
//! - Graduated VWAP and EMA cloud scoring
//! - Gamma wall position, regime and opposing wall penalty
//! - Patience candle (inside bar) detection
//! - Confluence aggregation with grade hysteresis
//! - Trade parameters, score explanations and setup lifecycle
//! - Legacy v1 scoring behind the shared `Scorer` trait
//! - Parallel batch evaluation

pub mod math;
pub mod levels;
pub mod trend;
pub mod vwap;
pub mod gamma;
pub mod patience;
pub mod hysteresis;
pub mod confluence;
pub mod trade_params;
pub mod explain;
pub mod legacy;
pub mod scorer;
pub mod setup;
pub mod context;
pub mod batch;

// Re-export commonly used types
pub use math::{safe_divide, safe_divide_value};
pub use levels::{identify_key_levels, nearest_level};
pub use trend::{calculate_ema, determine_trend, score_ema_cloud, score_trend_alignment, CloudScore, TrendDirection};
pub use vwap::{calculate_vwap, score_vwap, VwapScore};
pub use gamma::{calculate_opposing_wall_penalty, score_gamma_regime, score_gamma_wall_position, GammaRegime};
pub use patience::{detect_patience_candle, score_patience, PatienceCandle, PatienceQuality};
pub use hysteresis::{apply_hysteresis, HysteresisOutcome};
pub use confluence::{calculate_ltp2_score, ScoreEvaluation};
pub use trade_params::{calculate_trade_parameters, TradeParameters};
pub use explain::{explain_score, explain_score_at, ScoreExplanation};
pub use legacy::{calculate_legacy_score, LegacyGrade, LegacyScore};
pub use scorer::{LegacyV1Scorer, LtpV2Scorer, ScoreRequest, Scorer, ScorerFactory, ScoringStrategy, StrategyScore};
pub use setup::{DetectedSetup, SetupStage};
pub use batch::{evaluate_symbol, score_batch, SymbolInput, SymbolReport};
