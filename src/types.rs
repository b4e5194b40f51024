//! Shared value types for the scoring core
//!
//! Everything here is a plain value: produced by collaborators (bars, levels,
//! MTF rows, gamma data) or emitted by the engine (scores, hysteresis state).
//! JSON uses camelCase field names to match the consuming services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar, produced externally and ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Bar {
    /// High minus low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute body size
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Direction a setup is scored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// +1.0 for bullish, -1.0 for bearish
    pub fn sign(self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
        }
    }
}

/// Trend reported by an external MTF analysis row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    pub fn matches(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Trend::Bullish, Direction::Bullish) | (Trend::Bearish, Direction::Bearish)
        )
    }
}

/// Support or resistance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    Support,
    Resistance,
}

impl std::fmt::Display for LevelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelType::Support => write!(f, "support"),
            LevelType::Resistance => write!(f, "resistance"),
        }
    }
}

/// A clustered support/resistance level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLevel {
    #[serde(rename = "type")]
    pub level_type: LevelType,
    pub price: f64,
    pub timeframe: String,
    /// 0-100, 25 per merged swing point
    pub strength: f64,
}

/// Per-timeframe trend analysis, supplied externally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtfAnalysis {
    pub timeframe: String,
    pub trend: Trend,
    #[serde(default)]
    pub structure: String,
    #[serde(default)]
    pub ema_position: String,
    #[serde(default)]
    pub momentum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vwap_position: Option<String>,
}

/// Options-flow values for a symbol. Every field may be missing when the
/// provider had nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaSnapshot {
    #[serde(default)]
    pub call_wall: Option<f64>,
    #[serde(default)]
    pub put_wall: Option<f64>,
    #[serde(default)]
    pub zero_gamma: Option<f64>,
    #[serde(default)]
    pub gamma_exposure: Option<f64>,
}

/// Inputs for one v2 evaluation. Built fresh per evaluation, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    pub current_price: f64,
    #[serde(default)]
    pub previous_close: f64,
    pub ema8: f64,
    pub ema21: f64,
    pub vwap: f64,
    #[serde(default)]
    pub call_wall: Option<f64>,
    #[serde(default)]
    pub put_wall: Option<f64>,
    #[serde(default)]
    pub zero_gamma: Option<f64>,
    #[serde(default)]
    pub gamma_exposure: Option<f64>,
    /// Degraded patience flag, used when full OHLC is unavailable
    #[serde(default)]
    pub patience_detected: bool,
    #[serde(default)]
    pub patience_direction: Option<Direction>,
    #[serde(default)]
    pub previous_bar: Option<Bar>,
    #[serde(default)]
    pub current_bar: Option<Bar>,
}

/// Per-component points of one v2 evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub cloud: f64,
    pub vwap: f64,
    pub gamma_wall: f64,
    pub gamma_regime: f64,
    pub patience: f64,
    /// Zero or negative
    pub resistance_penalty: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    /// Sum of the six components, before clamping
    pub fn component_sum(&self) -> f64 {
        self.cloud
            + self.vwap
            + self.gamma_wall
            + self.gamma_regime
            + self.patience
            + self.resistance_penalty
    }
}

/// Discrete v2 trade-quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "Dumb Shit")]
    DumbShit,
    Decent,
    Sniper,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::Sniper => write!(f, "Sniper"),
            Grade::Decent => write!(f, "Decent"),
            Grade::DumbShit => write!(f, "Dumb Shit"),
        }
    }
}

/// Warning severity, ordered weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWarning {
    pub severity: Severity,
    pub message: String,
}

impl ScoreWarning {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ScoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Hysteresis details attached to a score when a previous state was supplied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStability {
    pub raw_score: f64,
    pub smoothed_score: f64,
    pub grade_locked: bool,
    pub candles_at_grade: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_grade: Option<Grade>,
}

/// Output of a v2 evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ltp2Score {
    /// Clamped raw total, 0-90
    pub score: f64,
    pub grade: Grade,
    pub direction: Direction,
    /// 0-100
    pub confidence: f64,
    pub breakdown: ScoreBreakdown,
    pub warnings: Vec<ScoreWarning>,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<ScoreStability>,
}

/// Per-symbol hysteresis state. Owned and stored by the caller; the engine
/// only ever returns a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHysteresisState {
    pub previous_grade: Grade,
    /// Most recent raw scores, oldest first
    pub previous_scores: Vec<f64>,
    pub candles_at_grade: u32,
}
