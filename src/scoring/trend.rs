//! Trend & Multi-Timeframe Engine
//!
//! - EMA over a value series (SMA-seeded)
//! - Single-series trend classification from swing structure
//! - Multi-timeframe alignment weighting
//! - Graduated EMA8/EMA21 cloud scoring

use crate::config::{CloudConfig, TrendConfig};
use crate::error::{ScoringError, ScoringResult};
use crate::scoring::math::{clamp_score, is_valid_price, safe_divide};
use crate::types::{Bar, Direction, MtfAnalysis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Classification of a single bar series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    Range,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Uptrend => write!(f, "uptrend"),
            TrendDirection::Downtrend => write!(f, "downtrend"),
            TrendDirection::Range => write!(f, "range"),
        }
    }
}

/// Strength label of the EMA cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudStrength {
    Strong,
    Moderate,
    Weak,
    Neutral,
}

impl std::fmt::Display for CloudStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudStrength::Strong => write!(f, "strong"),
            CloudStrength::Moderate => write!(f, "moderate"),
            CloudStrength::Weak => write!(f, "weak"),
            CloudStrength::Neutral => write!(f, "neutral"),
        }
    }
}

/// Result of the graduated EMA cloud scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudScore {
    pub score: f64,
    pub direction: Direction,
    pub strength: CloudStrength,
    /// (ema8 - ema21) / ema21 * 100
    pub spread_pct: f64,
}

/// Exponential moving average of `values`.
///
/// Seeded with the simple mean of the first `period` values, multiplier
/// 2 / (period + 1). A series shorter than `period` returns its last value,
/// an empty series returns 0. `period == 0` is a caller error.
pub fn calculate_ema(values: &[f64], period: usize) -> ScoringResult<f64> {
    if period == 0 {
        return Err(ScoringError::InvalidPeriod(period));
    }

    let Some(&last) = values.last() else {
        return Ok(0.0);
    };
    if values.len() < period {
        return Ok(last);
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let ema = values[period..]
        .iter()
        .fold(seed, |ema, &value| (value - ema) * multiplier + ema);

    Ok(ema)
}

/// EMA over bar closes
pub fn calculate_ema_of_closes(bars: &[Bar], period: usize) -> ScoringResult<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    calculate_ema(&closes, period)
}

/// Classify the last `lookback` bars as uptrend, downtrend or range.
///
/// Each consecutive pair is a transition: higher high + higher low counts up,
/// lower high + lower low counts down. A direction needs at least
/// `agreement_ratio` of the transitions. Fewer than `min_bars` bars is a range.
pub fn determine_trend(bars: &[Bar], config: &TrendConfig) -> TrendDirection {
    let min_bars = config.min_bars.max(2);
    if bars.len() < min_bars {
        return TrendDirection::Range;
    }

    let lookback = config.lookback.max(min_bars);
    let window = &bars[bars.len().saturating_sub(lookback)..];

    let mut up = 0usize;
    let mut down = 0usize;
    for pair in window.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.high > prev.high && curr.low > prev.low {
            up += 1;
        } else if curr.high < prev.high && curr.low < prev.low {
            down += 1;
        }
    }

    let transitions = (window.len() - 1) as f64;
    let up_ratio = safe_divide(up as f64, transitions);
    let down_ratio = safe_divide(down as f64, transitions);

    if up_ratio >= config.agreement_ratio && up_ratio > down_ratio {
        TrendDirection::Uptrend
    } else if down_ratio >= config.agreement_ratio && down_ratio > up_ratio {
        TrendDirection::Downtrend
    } else {
        TrendDirection::Range
    }
}

/// Weight configured for a timeframe (case-insensitive), else the unknown weight
pub fn timeframe_weight(timeframe: &str, config: &TrendConfig) -> f64 {
    config
        .timeframe_weights
        .get(&timeframe.to_ascii_lowercase())
        .copied()
        .unwrap_or(config.unknown_timeframe_weight)
}

/// Multi-timeframe alignment, 0-100.
///
/// Adds weight × 100 for every timeframe whose reported trend matches
/// `direction`.
pub fn score_trend_alignment(
    analyses: &[MtfAnalysis],
    direction: Direction,
    config: &TrendConfig,
) -> f64 {
    let total: f64 = analyses
        .iter()
        .filter(|a| a.trend.matches(direction))
        .map(|a| timeframe_weight(&a.timeframe, config) * 100.0)
        .sum();

    clamp_score(total, 0.0, 100.0)
}

/// Graduated EMA cloud score.
///
/// Inside the neutral zone the cloud earns `neutral_multiplier` of the weight
/// and the direction falls back to price vs VWAP. Outside it the direction is
/// the sign of the spread and the magnitude picks the bucket.
pub fn score_ema_cloud(
    ema8: f64,
    ema21: f64,
    price: f64,
    vwap: f64,
    max_weight: f64,
    config: &CloudConfig,
) -> CloudScore {
    let fallback_direction = if price >= vwap {
        Direction::Bullish
    } else {
        Direction::Bearish
    };

    if !is_valid_price(ema21) || !ema8.is_finite() {
        debug!("EMA cloud skipped: invalid EMAs ema8={} ema21={}", ema8, ema21);
        return CloudScore {
            score: 0.0,
            direction: fallback_direction,
            strength: CloudStrength::Neutral,
            spread_pct: 0.0,
        };
    }

    let spread_pct = safe_divide(ema8 - ema21, ema21) * 100.0;
    let magnitude = spread_pct.abs();

    if magnitude < config.neutral_zone_pct {
        return CloudScore {
            score: clamp_score(max_weight * config.neutral_multiplier, 0.0, max_weight),
            direction: fallback_direction,
            strength: CloudStrength::Neutral,
            spread_pct,
        };
    }

    let direction = if spread_pct > 0.0 {
        Direction::Bullish
    } else {
        Direction::Bearish
    };

    let (multiplier, strength) = if magnitude >= config.strong_spread_pct {
        (config.strong_multiplier, CloudStrength::Strong)
    } else if magnitude >= config.moderate_spread_pct {
        (config.moderate_multiplier, CloudStrength::Moderate)
    } else if magnitude >= config.weak_spread_pct {
        (config.weak_multiplier, CloudStrength::Weak)
    } else {
        (config.floor_multiplier, CloudStrength::Weak)
    };

    CloudScore {
        score: clamp_score(max_weight * multiplier, 0.0, max_weight),
        direction,
        strength,
        spread_pct,
    }
}
