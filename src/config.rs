//! Configuration for the scoring engine
//!
//! Every weight, threshold and bucket the scorers use lives here. Defaults
//! reproduce the production calibration; a JSON override only needs the
//! fields it changes.

use crate::error::{ScoringError, ScoringResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed volatility proxy used for stop placement: 1% of price.
/// This is a heuristic, not an Average True Range.
pub const HEURISTIC_VOLATILITY_PCT: f64 = 0.01;

/// Complete scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub weights: WeightsConfig,
    pub grades: GradeConfig,
    pub cloud: CloudConfig,
    pub vwap: VwapConfig,
    pub gamma: GammaConfig,
    pub patience: PatienceConfig,
    pub levels: LevelConfig,
    pub trend: TrendConfig,
    pub trade: TradeConfig,
    pub legacy: LegacyConfig,
    pub setup: SetupConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            grades: GradeConfig::default(),
            cloud: CloudConfig::default(),
            vwap: VwapConfig::default(),
            gamma: GammaConfig::default(),
            patience: PatienceConfig::default(),
            levels: LevelConfig::default(),
            trend: TrendConfig::default(),
            trade: TradeConfig::default(),
            legacy: LegacyConfig::default(),
            setup: SetupConfig::default(),
        }
    }
}

/// Maximum points per v2 component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeightsConfig {
    pub cloud: f64,
    pub vwap: f64,
    pub gamma_wall: f64,
    pub gamma_regime: f64,
    pub patience: f64,
    /// Largest opposing-wall deduction (positive number)
    pub max_penalty: f64,
    /// Clamp ceiling for the raw total
    pub max_total: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            cloud: 25.0,
            vwap: 20.0,
            gamma_wall: 20.0,
            gamma_regime: 15.0,
            patience: 10.0,
            max_penalty: 20.0,
            max_total: 90.0,
        }
    }
}

impl WeightsConfig {
    /// Sum of the five positive components
    pub fn max_component_sum(&self) -> f64 {
        self.cloud + self.vwap + self.gamma_wall + self.gamma_regime + self.patience
    }
}

/// Grade thresholds and hysteresis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradeConfig {
    /// Smoothed score needed for Sniper (default: 75)
    pub sniper_threshold: f64,
    /// Smoothed score needed for Decent (default: 50)
    pub decent_threshold: f64,
    /// Points below a threshold a held grade survives (default: 5)
    pub hysteresis_buffer: f64,
    /// Previous raw scores averaged with the current one (default: 3)
    pub smoothing_window: usize,
    /// Raw scores kept in the returned state (default: 5)
    pub history_limit: usize,
}

impl Default for GradeConfig {
    fn default() -> Self {
        Self {
            sniper_threshold: 75.0,
            decent_threshold: 50.0,
            hysteresis_buffer: 5.0,
            smoothing_window: 3,
            history_limit: 5,
        }
    }
}

/// EMA8/EMA21 cloud buckets (spread in percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    /// |spread| below this is the neutral zone (default: 0.1%)
    pub neutral_zone_pct: f64,
    pub neutral_multiplier: f64,
    pub strong_spread_pct: f64,
    pub moderate_spread_pct: f64,
    pub weak_spread_pct: f64,
    pub strong_multiplier: f64,
    pub moderate_multiplier: f64,
    pub weak_multiplier: f64,
    /// Outside the neutral zone but below every bucket
    pub floor_multiplier: f64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            ema_fast: 8,
            ema_slow: 21,
            neutral_zone_pct: 0.1,
            neutral_multiplier: 0.3,
            strong_spread_pct: 0.5,
            moderate_spread_pct: 0.3,
            weak_spread_pct: 0.15,
            strong_multiplier: 1.0,
            moderate_multiplier: 0.85,
            weak_multiplier: 0.70,
            floor_multiplier: 0.5,
        }
    }
}

/// VWAP distance buckets (percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VwapConfig {
    /// Wrong-side distance that still earns partial credit (default: 0.1%)
    pub wrong_side_tolerance_pct: f64,
    pub wrong_side_multiplier: f64,
    /// Aligned-side tiers, largest distance first
    pub tier_distance_pcts: [f64; 4],
    pub tier_multipliers: [f64; 4],
    pub floor_multiplier: f64,
}

impl Default for VwapConfig {
    fn default() -> Self {
        Self {
            wrong_side_tolerance_pct: 0.1,
            wrong_side_multiplier: 0.25,
            tier_distance_pcts: [0.5, 0.3, 0.15, 0.05],
            tier_multipliers: [1.0, 0.9, 0.75, 0.6],
            floor_multiplier: 0.5,
        }
    }
}

/// Opposing gamma wall penalty table (percent distance → points)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GammaConfig {
    /// Distances, largest first
    pub penalty_distance_pcts: [f64; 4],
    /// Points deducted at each distance (zero or negative)
    pub penalty_points: [f64; 4],
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            penalty_distance_pcts: [2.0, 1.5, 1.0, 0.5],
            penalty_points: [0.0, -5.0, -10.0, -15.0],
        }
    }
}

/// Inside-bar quality classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatienceConfig {
    pub high_body_ratio: f64,
    pub high_compression: f64,
    pub medium_body_ratio: f64,
    pub medium_compression: f64,
    pub high_multiplier: f64,
    pub medium_multiplier: f64,
    pub low_multiplier: f64,
    /// Midpoint distance to VWAP/walls counted as "at level" (default: 0.3%)
    pub level_proximity_pct: f64,
    pub at_level_multiplier: f64,
    pub off_level_multiplier: f64,
}

impl Default for PatienceConfig {
    fn default() -> Self {
        Self {
            high_body_ratio: 0.35,
            high_compression: 0.5,
            medium_body_ratio: 0.5,
            medium_compression: 0.7,
            high_multiplier: 1.0,
            medium_multiplier: 0.7,
            low_multiplier: 0.4,
            level_proximity_pct: 0.3,
            at_level_multiplier: 1.0,
            off_level_multiplier: 0.5,
        }
    }
}

/// Swing-point clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelConfig {
    /// Fewer bars than this yields no levels (default: 10)
    pub min_bars: usize,
    /// Bars on each side a swing must exceed (default: 2)
    pub swing_span: usize,
    /// Relative merge tolerance (default: 0.005 = 0.5%)
    pub cluster_tolerance: f64,
    pub min_touches: usize,
    pub strength_per_touch: f64,
    pub max_levels: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            min_bars: 10,
            swing_span: 2,
            cluster_tolerance: 0.005,
            min_touches: 2,
            strength_per_touch: 25.0,
            max_levels: 10,
        }
    }
}

/// Trend classification and multi-timeframe weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendConfig {
    /// Fewer bars than this is always a range (default: 5)
    pub min_bars: usize,
    /// Bars examined from the end of the series (default: 10)
    pub lookback: usize,
    /// Share of transitions that must agree (default: 0.5)
    pub agreement_ratio: f64,
    pub timeframe_weights: BTreeMap<String, f64>,
    pub unknown_timeframe_weight: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        let timeframe_weights = [("5m", 0.15), ("15m", 0.20), ("1h", 0.30), ("4h", 0.20), ("1d", 0.15)]
            .into_iter()
            .map(|(tf, w)| (tf.to_string(), w))
            .collect();

        Self {
            min_bars: 5,
            lookback: 10,
            agreement_ratio: 0.5,
            timeframe_weights,
            unknown_timeframe_weight: 0.1,
        }
    }
}

/// Entry/stop/target derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TradeConfig {
    pub heuristic_volatility_pct: f64,
    /// R multiples for target1..target3
    pub target_multiples: [f64; 3],
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            heuristic_volatility_pct: HEURISTIC_VOLATILITY_PCT,
            target_multiples: [1.0, 2.0, 3.0],
        }
    }
}

/// Legacy v1 weighted grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyConfig {
    pub level_weight: f64,
    pub trend_weight: f64,
    pub patience_weight: f64,
    pub grade_a: f64,
    pub grade_b: f64,
    pub grade_c: f64,
    pub grade_d: f64,
    /// Nearest level within this distance earns its full strength
    pub level_full_credit_pct: f64,
    /// Credit reaches zero at this distance
    pub level_zero_credit_pct: f64,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            level_weight: 0.35,
            trend_weight: 0.35,
            patience_weight: 0.30,
            grade_a: 90.0,
            grade_b: 80.0,
            grade_c: 70.0,
            grade_d: 60.0,
            level_full_credit_pct: 0.5,
            level_zero_credit_pct: 2.0,
        }
    }
}

/// DetectedSetup lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetupConfig {
    /// Raw score needed to open a setup (default: 50)
    pub min_setup_score: f64,
    pub ttl_minutes: i64,
    /// Move beyond entry that counts as triggered (default: 0.1%)
    pub trigger_buffer_pct: f64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            min_setup_score: 50.0,
            ttl_minutes: 30,
            trigger_buffer_pct: 0.1,
        }
    }
}

impl ScoringConfig {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json_str(json: &str) -> ScoringResult<Self> {
        let config: ScoringConfig =
            serde_json::from_str(json).map_err(|e| ScoringError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the scorers rely on
    pub fn validate(&self) -> ScoringResult<()> {
        let w = &self.weights;
        let weights = [
            w.cloud,
            w.vwap,
            w.gamma_wall,
            w.gamma_regime,
            w.patience,
            w.max_penalty,
        ];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("component weights must be finite and non-negative"));
        }
        if !(w.max_total > 0.0) {
            return Err(invalid("maxTotal must be positive"));
        }

        let g = &self.grades;
        if !(g.decent_threshold < g.sniper_threshold) {
            return Err(invalid("decentThreshold must be below sniperThreshold"));
        }
        if g.hysteresis_buffer < 0.0 || g.hysteresis_buffer >= g.decent_threshold {
            return Err(invalid("hysteresisBuffer must be in [0, decentThreshold)"));
        }
        if g.smoothing_window == 0 || g.history_limit < g.smoothing_window {
            return Err(invalid("historyLimit must be >= smoothingWindow >= 1"));
        }

        if !is_descending(&self.vwap.tier_distance_pcts) {
            return Err(invalid("vwap tiers must be strictly descending"));
        }
        if !is_descending(&self.gamma.penalty_distance_pcts) {
            return Err(invalid("gamma penalty distances must be strictly descending"));
        }
        if self.gamma.penalty_points.iter().any(|p| *p > 0.0 || -p > w.max_penalty) {
            return Err(invalid("gamma penalty points must be within [-maxPenalty, 0]"));
        }
        let c = &self.cloud;
        if !(c.strong_spread_pct > c.moderate_spread_pct && c.moderate_spread_pct > c.weak_spread_pct) {
            return Err(invalid("cloud spread buckets must be strictly descending"));
        }
        if c.ema_fast == 0 || c.ema_slow == 0 {
            return Err(invalid("EMA periods must be at least 1"));
        }

        if self.levels.swing_span == 0 || self.levels.max_levels == 0 {
            return Err(invalid("swingSpan and maxLevels must be at least 1"));
        }

        let l = &self.legacy;
        let weight_sum = l.level_weight + l.trend_weight + l.patience_weight;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(invalid("legacy weights must sum to 1.0"));
        }
        if !(l.grade_a > l.grade_b && l.grade_b > l.grade_c && l.grade_c > l.grade_d) {
            return Err(invalid("legacy grade thresholds must be strictly descending"));
        }
        if !(l.level_zero_credit_pct > l.level_full_credit_pct) {
            return Err(invalid("levelZeroCreditPct must exceed levelFullCreditPct"));
        }

        if self.setup.ttl_minutes <= 0 {
            return Err(invalid("setup ttlMinutes must be positive"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> ScoringError {
    ScoringError::InvalidConfig(reason.to_string())
}

fn is_descending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] > w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_weights_cap_at_ninety() {
        let w = WeightsConfig::default();
        assert_eq!(w.max_component_sum(), 90.0);
        assert_eq!(w.max_total, 90.0);
    }

    #[test]
    fn test_partial_override() {
        let config = ScoringConfig::from_json_str(r#"{"grades":{"hysteresisBuffer":3.0}}"#).unwrap();
        assert_eq!(config.grades.hysteresis_buffer, 3.0);
        assert_eq!(config.grades.sniper_threshold, 75.0);
        assert_eq!(config.weights.cloud, 25.0);
    }

    #[test]
    fn test_keys_are_camel_case() {
        let config = ScoringConfig::from_json_str(
            r#"{"weights":{"gammaWall":15.0},"setup":{"ttlMinutes":45,"minSetupScore":60.0}}"#,
        )
        .unwrap();
        assert_eq!(config.weights.gamma_wall, 15.0);
        assert_eq!(config.setup.ttl_minutes, 45);
        assert_eq!(config.setup.min_setup_score, 60.0);

        let json = serde_json::to_value(ScoringConfig::default()).unwrap();
        assert_eq!(json["grades"]["hysteresisBuffer"], 5.0);
        assert!(json["grades"].get("hysteresis_buffer").is_none());
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let result = ScoringConfig::from_json_str(r#"{"grades":{"sniperThreshold":40.0}}"#);
        assert!(matches!(result, Err(ScoringError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_legacy_weights() {
        let mut config = ScoringConfig::default();
        config.legacy.patience_weight = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        let result = ScoringConfig::from_json_str("{not json");
        assert!(matches!(result, Err(ScoringError::ConfigParse(_))));
    }
}
