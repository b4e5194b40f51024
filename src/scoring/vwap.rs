//! VWAP computation and graduated VWAP scoring

use crate::config::VwapConfig;
use crate::scoring::math::{clamp_score, is_valid_price, percent_distance, safe_divide};
use crate::types::{Bar, Direction, ScoreWarning, Severity};
use serde::{Deserialize, Serialize};

/// Result of the VWAP scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VwapScore {
    pub score: f64,
    /// (price - vwap) / vwap * 100
    pub distance_pct: f64,
    pub aligned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ScoreWarning>,
}

/// Volume Weighted Average Price over `bars` using the typical price.
/// Zero total volume yields 0.
pub fn calculate_vwap(bars: &[Bar]) -> f64 {
    let (sum_pv, sum_v) = bars.iter().fold((0.0, 0.0), |(pv, v), bar| {
        (pv + bar.typical_price() * bar.volume, v + bar.volume)
    });

    safe_divide(sum_pv, sum_v)
}

/// Graduated VWAP score for `direction`.
///
/// Aligned side (above VWAP for bullish, below for bearish) is bucketed by
/// distance. The wrong side only earns partial credit while hugging VWAP.
pub fn score_vwap(price: f64, vwap: f64, direction: Direction, max_weight: f64, config: &VwapConfig) -> VwapScore {
    if !is_valid_price(vwap) || !is_valid_price(price) {
        return VwapScore {
            score: 0.0,
            distance_pct: 0.0,
            aligned: false,
            warning: Some(ScoreWarning::new(Severity::Info, "VWAP unavailable - no VWAP credit")),
        };
    }

    let distance_pct = percent_distance(price, vwap);
    let magnitude = distance_pct.abs();
    let aligned = match direction {
        Direction::Bullish => distance_pct >= 0.0,
        Direction::Bearish => distance_pct <= 0.0,
    };

    if !aligned {
        if magnitude <= config.wrong_side_tolerance_pct {
            return VwapScore {
                score: clamp_score(max_weight * config.wrong_side_multiplier, 0.0, max_weight),
                distance_pct,
                aligned,
                warning: None,
            };
        }

        let side = match direction {
            Direction::Bullish => "below",
            Direction::Bearish => "above",
        };
        return VwapScore {
            score: 0.0,
            distance_pct,
            aligned,
            warning: Some(ScoreWarning::new(
                Severity::Moderate,
                format!(
                    "Price is {:.2}% {} VWAP {:.2} - fighting the {} bias",
                    magnitude, side, vwap, direction
                ),
            )),
        };
    }

    let multiplier = config
        .tier_distance_pcts
        .iter()
        .zip(config.tier_multipliers.iter())
        .find(|(threshold, _)| magnitude >= **threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(config.floor_multiplier);

    VwapScore {
        score: clamp_score(max_weight * multiplier, 0.0, max_weight),
        distance_pct,
        aligned,
        warning: None,
    }
}
