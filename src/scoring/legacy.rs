//! Legacy v1 scoring: weighted level / trend / patience average with letter
//! grades. Kept as a separate strategy; it shares no thresholds with v2.

use crate::config::LegacyConfig;
use crate::scoring::math::{clamp_score, percent_distance, safe_divide};
use crate::types::KeyLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LegacyGrade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for LegacyGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            LegacyGrade::A => "A",
            LegacyGrade::B => "B",
            LegacyGrade::C => "C",
            LegacyGrade::D => "D",
            LegacyGrade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyScore {
    /// Inputs after clamping to 0-100
    pub level: f64,
    pub trend: f64,
    pub patience: f64,
    pub overall: f64,
    pub grade: LegacyGrade,
}

pub fn legacy_grade(overall: f64, config: &LegacyConfig) -> LegacyGrade {
    if overall >= config.grade_a {
        LegacyGrade::A
    } else if overall >= config.grade_b {
        LegacyGrade::B
    } else if overall >= config.grade_c {
        LegacyGrade::C
    } else if overall >= config.grade_d {
        LegacyGrade::D
    } else {
        LegacyGrade::F
    }
}

/// overall = level_weight × level + trend_weight × trend + patience_weight × patience
pub fn calculate_legacy_score(level: f64, trend: f64, patience: f64, config: &LegacyConfig) -> LegacyScore {
    let level = clamp_score(level, 0.0, 100.0);
    let trend = clamp_score(trend, 0.0, 100.0);
    let patience = clamp_score(patience, 0.0, 100.0);

    let overall = clamp_score(
        config.level_weight * level + config.trend_weight * trend + config.patience_weight * patience,
        0.0,
        100.0,
    );

    LegacyScore {
        level,
        trend,
        patience,
        overall,
        grade: legacy_grade(overall, config),
    }
}

/// Level input for the legacy scorer: the level's strength scaled by how
/// close price is to it. Full strength within `level_full_credit_pct`,
/// falling linearly to zero at `level_zero_credit_pct`.
pub fn level_proximity_score(level: Option<&KeyLevel>, price: f64, config: &LegacyConfig) -> f64 {
    let Some(level) = level else {
        return 0.0;
    };

    let distance = percent_distance(price, level.price).abs();
    let factor = if distance <= config.level_full_credit_pct {
        1.0
    } else {
        let span = config.level_zero_credit_pct - config.level_full_credit_pct;
        1.0 - safe_divide(distance - config.level_full_credit_pct, span)
    };

    clamp_score(level.strength * factor.clamp(0.0, 1.0), 0.0, 100.0)
}
