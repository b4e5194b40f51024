//! Patience Candle Detection
//!
//! A patience candle is an inside bar: its high and low sit strictly inside
//! the previous bar's range. Quality comes from body size and compression,
//! and candles forming at VWAP or a gamma wall count double.
//!
//! When the caller could not supply both bars, scoring falls back to the
//! boolean flag + direction carried on the context.

use crate::config::PatienceConfig;
use crate::scoring::math::{clamp_score, percent_distance, safe_divide_value, valid_level};
use crate::types::{Bar, Direction, MarketContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inside-bar quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatienceQuality {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for PatienceQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatienceQuality::High => write!(f, "high"),
            PatienceQuality::Medium => write!(f, "medium"),
            PatienceQuality::Low => write!(f, "low"),
        }
    }
}

/// Which path produced the patience score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatienceSource {
    /// Full OHLC of both bars
    Candles,
    /// Boolean flag only
    Flag,
}

/// Inside-bar analysis of the current bar against the previous one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatienceCandle {
    pub is_inside_bar: bool,
    /// Bullish iff close > open
    pub direction: Direction,
    pub quality: PatienceQuality,
    /// |close - open| / range
    pub body_ratio: f64,
    /// range / previous range
    pub compression: f64,
    pub midpoint: f64,
}

/// Result of the patience scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatienceScore {
    pub score: f64,
    pub source: PatienceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candle: Option<PatienceCandle>,
    pub at_level: bool,
    pub direction_matches: bool,
}

/// Classify quality from body ratio and compression
pub fn classify_quality(body_ratio: f64, compression: f64, config: &PatienceConfig) -> PatienceQuality {
    if body_ratio < config.high_body_ratio && compression < config.high_compression {
        PatienceQuality::High
    } else if body_ratio < config.medium_body_ratio && compression < config.medium_compression {
        PatienceQuality::Medium
    } else {
        PatienceQuality::Low
    }
}

/// Inspect `current` as a potential inside bar of `previous`
pub fn detect_patience_candle(current: &Bar, previous: &Bar, config: &PatienceConfig) -> PatienceCandle {
    let is_inside_bar = current.high < previous.high && current.low > previous.low;
    let direction = if current.is_bullish() {
        Direction::Bullish
    } else {
        Direction::Bearish
    };

    // Degenerate ranges classify as low quality
    let body_ratio = safe_divide_value(current.body(), current.range(), 1.0);
    let compression = safe_divide_value(current.range(), previous.range(), 1.0);

    PatienceCandle {
        is_inside_bar,
        direction,
        quality: classify_quality(body_ratio, compression, config),
        body_ratio,
        compression,
        midpoint: current.midpoint(),
    }
}

/// True when `price` lies within `proximity_pct` percent of any given level
pub fn is_at_level(price: f64, levels: &[Option<f64>], proximity_pct: f64) -> bool {
    levels
        .iter()
        .filter_map(|l| valid_level(*l))
        .any(|level| percent_distance(price, level).abs() <= proximity_pct)
}

fn quality_multiplier(quality: PatienceQuality, config: &PatienceConfig) -> f64 {
    match quality {
        PatienceQuality::High => config.high_multiplier,
        PatienceQuality::Medium => config.medium_multiplier,
        PatienceQuality::Low => config.low_multiplier,
    }
}

/// Patience points for `direction`, 0..=max_weight.
///
/// With both bars present: round(max × quality × level) for an inside bar
/// whose direction matches. Otherwise the flag path grants the full weight
/// when the flagged direction matches.
pub fn score_patience(
    ctx: &MarketContext,
    direction: Direction,
    max_weight: f64,
    config: &PatienceConfig,
) -> PatienceScore {
    match (ctx.current_bar.as_ref(), ctx.previous_bar.as_ref()) {
        (Some(current), Some(previous)) => {
            let candle = detect_patience_candle(current, previous, config);
            let at_level = is_at_level(
                candle.midpoint,
                &[Some(ctx.vwap), ctx.put_wall, ctx.call_wall],
                config.level_proximity_pct,
            );
            let direction_matches = candle.direction == direction;

            let score = if candle.is_inside_bar && direction_matches {
                let level_multiplier = if at_level {
                    config.at_level_multiplier
                } else {
                    config.off_level_multiplier
                };
                (max_weight * quality_multiplier(candle.quality, config) * level_multiplier).round()
            } else {
                0.0
            };

            debug!(
                "Patience candle: inside={} quality={} at_level={} matches={} score={}",
                candle.is_inside_bar, candle.quality, at_level, direction_matches, score
            );

            PatienceScore {
                score: clamp_score(score, 0.0, max_weight),
                source: PatienceSource::Candles,
                candle: Some(candle),
                at_level,
                direction_matches,
            }
        }
        _ => {
            let direction_matches = ctx.patience_direction == Some(direction);
            let score = if ctx.patience_detected && direction_matches {
                max_weight
            } else {
                0.0
            };

            PatienceScore {
                score: clamp_score(score, 0.0, max_weight),
                source: PatienceSource::Flag,
                candle: None,
                at_level: false,
                direction_matches,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar(open: f64, high: f64, low: f64, close: f64, minute: i64) -> Bar {
        Bar {
            open,
            high,
            low,
            close,
            volume: 1_000.0,
            timestamp: Utc.with_ymd_and_hms(2025, 9, 15, 14, 0, 0).unwrap() + Duration::minutes(minute),
        }
    }

    fn context(previous: Option<Bar>, current: Option<Bar>) -> MarketContext {
        MarketContext {
            current_price: 100.0,
            previous_close: 99.5,
            ema8: 100.2,
            ema21: 100.0,
            vwap: 100.0,
            call_wall: Some(110.0),
            put_wall: Some(90.0),
            zero_gamma: None,
            gamma_exposure: Some(1.0),
            patience_detected: false,
            patience_direction: None,
            previous_bar: previous,
            current_bar: current,
        }
    }

    #[test]
    fn test_inside_bar_detection() {
        let previous = bar(99.0, 102.0, 98.0, 101.0, 0);
        let current = bar(99.8, 100.5, 99.5, 100.1, 5);
        let candle = detect_patience_candle(&current, &previous, &PatienceConfig::default());
        assert!(candle.is_inside_bar);
        assert_eq!(candle.direction, Direction::Bullish);

        let bearish = bar(100.1, 100.5, 99.5, 99.8, 5);
        let candle = detect_patience_candle(&bearish, &previous, &PatienceConfig::default());
        assert_eq!(candle.direction, Direction::Bearish);

        let outside = bar(99.8, 102.5, 99.5, 100.1, 5);
        assert!(!detect_patience_candle(&outside, &previous, &PatienceConfig::default()).is_inside_bar);
    }

    #[test]
    fn test_quality_classification() {
        let config = PatienceConfig::default();
        assert_eq!(classify_quality(0.2, 0.4, &config), PatienceQuality::High);
        assert_eq!(classify_quality(0.4, 0.6, &config), PatienceQuality::Medium);
        assert_eq!(classify_quality(0.2, 0.6, &config), PatienceQuality::Medium);
        assert_eq!(classify_quality(0.6, 0.3, &config), PatienceQuality::Low);
    }

    #[test]
    fn test_high_quality_at_vwap_scores_full() {
        // range 1.0 (body 0.3 → 0.3), previous range 4.0 (compression 0.25)
        let previous = bar(99.0, 102.0, 98.0, 101.0, 0);
        let current = bar(99.8, 100.5, 99.5, 100.1, 5);
        let ctx = context(Some(previous), Some(current));
        let result = score_patience(&ctx, Direction::Bullish, 10.0, &PatienceConfig::default());
        assert_eq!(result.source, PatienceSource::Candles);
        assert!(result.at_level);
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn test_off_level_medium_quality_rounds() {
        // Midpoint 105 far from VWAP and walls; body 0.4, compression 0.6
        let previous = bar(103.0, 108.0, 103.0, 104.0, 0);
        let current = bar(104.0, 106.5, 103.5, 105.2, 5);
        let mut ctx = context(Some(previous), Some(current));
        ctx.vwap = 100.0;
        let result = score_patience(&ctx, Direction::Bullish, 10.0, &PatienceConfig::default());
        assert!(!result.at_level);
        // 10 × 0.7 × 0.5 = 3.5 → 4
        assert_eq!(result.score, 4.0);
    }

    #[test]
    fn test_direction_mismatch_scores_zero() {
        let previous = bar(99.0, 102.0, 98.0, 101.0, 0);
        let current = bar(99.8, 100.5, 99.5, 100.1, 5);
        let ctx = context(Some(previous), Some(current));
        let result = score_patience(&ctx, Direction::Bearish, 10.0, &PatienceConfig::default());
        assert!(!result.direction_matches);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_flag_fallback() {
        let mut ctx = context(None, Some(bar(99.8, 100.5, 99.5, 100.1, 5)));
        ctx.patience_detected = true;
        ctx.patience_direction = Some(Direction::Bearish);

        let matched = score_patience(&ctx, Direction::Bearish, 10.0, &PatienceConfig::default());
        assert_eq!(matched.source, PatienceSource::Flag);
        assert_eq!(matched.score, 10.0);

        let mismatched = score_patience(&ctx, Direction::Bullish, 10.0, &PatienceConfig::default());
        assert_eq!(mismatched.score, 0.0);
    }

    #[test]
    fn test_is_at_level() {
        assert!(is_at_level(100.25, &[Some(100.0)], 0.3));
        assert!(!is_at_level(100.5, &[Some(100.0), None], 0.3));
        assert!(!is_at_level(100.0, &[None, Some(0.0)], 0.3));
    }
}
