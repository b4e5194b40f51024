//! Key Level Identification
//!
//! Finds swing highs/lows and clusters nearby swings into support and
//! resistance levels:
//! - Swing high: high exceeds the highs of the `swing_span` bars on each side
//! - Swing low: mirror image on lows
//! - Swings within the relative tolerance merge into one cluster
//! - Clusters touched at least twice become levels, strength 25 per touch (max 100)
//!
//! The cluster price is a running pairwise average, so it depends on the
//! order swings arrive in. That is accepted; it is not a true centroid.

use crate::config::LevelConfig;
use crate::scoring::math::safe_divide_value;
use crate::types::{Bar, Direction, KeyLevel, LevelType};
use tracing::debug;

/// A swing cluster under construction
#[derive(Debug, Clone)]
struct SwingCluster {
    price: f64,
    touches: usize,
}

/// Indices of swing highs
pub fn find_swing_highs(bars: &[Bar], span: usize) -> Vec<usize> {
    find_swings(bars, span, |candidate, other| candidate.high > other.high)
}

/// Indices of swing lows
pub fn find_swing_lows(bars: &[Bar], span: usize) -> Vec<usize> {
    find_swings(bars, span, |candidate, other| candidate.low < other.low)
}

fn find_swings<F>(bars: &[Bar], span: usize, beats: F) -> Vec<usize>
where
    F: Fn(&Bar, &Bar) -> bool,
{
    if span == 0 || bars.len() < span * 2 + 1 {
        return Vec::new();
    }

    (span..bars.len() - span)
        .filter(|&i| {
            let candidate = &bars[i];
            bars[i - span..i].iter().all(|b| beats(candidate, b))
                && bars[i + 1..=i + span].iter().all(|b| beats(candidate, b))
        })
        .collect()
}

/// Merge swing prices into clusters, in the order given
fn cluster_prices(prices: impl Iterator<Item = f64>, tolerance: f64) -> Vec<SwingCluster> {
    let mut clusters: Vec<SwingCluster> = Vec::new();

    for price in prices {
        let existing = clusters.iter_mut().find(|c| {
            let relative = safe_divide_value((price - c.price).abs(), c.price, f64::INFINITY);
            relative <= tolerance
        });

        match existing {
            Some(cluster) => {
                cluster.price = (cluster.price + price) / 2.0;
                cluster.touches += 1;
            }
            None => clusters.push(SwingCluster { price, touches: 1 }),
        }
    }

    clusters
}

/// Identify support/resistance levels from a bar series.
///
/// Returns an empty vector for fewer than `min_bars` bars. Output is sorted
/// by strength (strongest first) and capped to `max_levels`.
pub fn identify_key_levels(bars: &[Bar], timeframe: &str, config: &LevelConfig) -> Vec<KeyLevel> {
    if bars.len() < config.min_bars {
        debug!(
            "Level identification skipped: {} bars (need {})",
            bars.len(),
            config.min_bars
        );
        return Vec::new();
    }

    let highs = find_swing_highs(bars, config.swing_span);
    let lows = find_swing_lows(bars, config.swing_span);

    let resistance = cluster_prices(highs.iter().map(|&i| bars[i].high), config.cluster_tolerance);
    let support = cluster_prices(lows.iter().map(|&i| bars[i].low), config.cluster_tolerance);

    let mut levels: Vec<KeyLevel> = resistance
        .into_iter()
        .map(|c| (LevelType::Resistance, c))
        .chain(support.into_iter().map(|c| (LevelType::Support, c)))
        .filter(|(_, c)| c.touches >= config.min_touches)
        .map(|(level_type, c)| KeyLevel {
            level_type,
            price: c.price,
            timeframe: timeframe.to_string(),
            strength: (c.touches as f64 * config.strength_per_touch).min(100.0),
        })
        .collect();

    // Stable sort keeps discovery order among equal strengths
    levels.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    levels.truncate(config.max_levels);

    debug!(
        "Identified {} key levels from {} swing highs / {} swing lows",
        levels.len(),
        highs.len(),
        lows.len()
    );

    levels
}

/// Pick the level a trade in `direction` would lean on.
///
/// Bullish: highest support at or below price. Bearish: lowest resistance at
/// or above price. Falls back to the closest level of any type.
pub fn nearest_level(levels: &[KeyLevel], price: f64, direction: Direction) -> Option<&KeyLevel> {
    let preferred = match direction {
        Direction::Bullish => levels
            .iter()
            .filter(|l| l.level_type == LevelType::Support && l.price <= price)
            .max_by(|a, b| a.price.total_cmp(&b.price)),
        Direction::Bearish => levels
            .iter()
            .filter(|l| l.level_type == LevelType::Resistance && l.price >= price)
            .min_by(|a, b| a.price.total_cmp(&b.price)),
    };

    preferred.or_else(|| {
        levels
            .iter()
            .min_by(|a, b| (a.price - price).abs().total_cmp(&(b.price - price).abs()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from(highs: &[f64], lows: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap();
        highs
            .iter()
            .zip(lows)
            .enumerate()
            .map(|(i, (&high, &low))| Bar {
                open: (high + low) / 2.0,
                high,
                low,
                close: (high + low) / 2.0,
                volume: 1000.0,
                timestamp: start + Duration::minutes(5 * i as i64),
            })
            .collect()
    }

    fn sample_bars() -> Vec<Bar> {
        let highs = [
            100.0, 101.0, 105.0, 101.0, 100.0, 100.0, 101.0, 105.2, 101.0, 100.0, 100.0, 101.0,
            104.9, 101.0, 100.0,
        ];
        let mut lows = [90.0; 15];
        lows[5] = 85.0;
        lows[10] = 85.2;
        bars_from(&highs, &lows)
    }

    #[test]
    fn test_too_few_bars_returns_empty() {
        let bars = sample_bars();
        let levels = identify_key_levels(&bars[..9], "5m", &LevelConfig::default());
        assert!(levels.is_empty());
    }

    #[test]
    fn test_swing_detection() {
        let bars = sample_bars();
        assert_eq!(find_swing_highs(&bars, 2), vec![2, 7, 12]);
        assert_eq!(find_swing_lows(&bars, 2), vec![5, 10]);
    }

    #[test]
    fn test_clusters_become_levels() {
        let bars = sample_bars();
        let levels = identify_key_levels(&bars, "5m", &LevelConfig::default());
        assert_eq!(levels.len(), 2);

        let resistance = &levels[0];
        assert_eq!(resistance.level_type, LevelType::Resistance);
        assert_eq!(resistance.strength, 75.0);
        // (105 + 105.2) / 2 = 105.1, then (105.1 + 104.9) / 2 = 105.0
        assert!((resistance.price - 105.0).abs() < 1e-9);

        let support = &levels[1];
        assert_eq!(support.level_type, LevelType::Support);
        assert_eq!(support.strength, 50.0);
        assert!((support.price - 85.1).abs() < 1e-9);
        assert_eq!(support.timeframe, "5m");
    }

    #[test]
    fn test_single_touch_is_not_a_level() {
        let highs = [100.0, 101.0, 110.0, 101.0, 100.0, 100.0, 101.0, 120.0, 101.0, 100.0, 100.0];
        let lows = [90.0; 11];
        let levels = identify_key_levels(&bars_from(&highs, &lows), "5m", &LevelConfig::default());
        assert!(levels.is_empty());
    }

    #[test]
    fn test_levels_capped_and_strength_bounded() {
        // 12 touches of the same high: strength caps at 100, one level
        let mut highs = Vec::new();
        for _ in 0..12 {
            highs.extend_from_slice(&[100.0, 101.0, 105.0]);
        }
        highs.extend_from_slice(&[101.0, 100.0]);
        let lows = vec![90.0; highs.len()];
        let levels = identify_key_levels(&bars_from(&highs, &lows), "15m", &LevelConfig::default());
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].strength, 100.0);
    }

    #[test]
    fn test_nearest_level() {
        let levels = vec![
            KeyLevel { level_type: LevelType::Support, price: 95.0, timeframe: "5m".into(), strength: 50.0 },
            KeyLevel { level_type: LevelType::Support, price: 98.0, timeframe: "5m".into(), strength: 50.0 },
            KeyLevel { level_type: LevelType::Resistance, price: 104.0, timeframe: "5m".into(), strength: 50.0 },
        ];
        assert_eq!(nearest_level(&levels, 100.0, Direction::Bullish).unwrap().price, 98.0);
        assert_eq!(nearest_level(&levels, 100.0, Direction::Bearish).unwrap().price, 104.0);
        // Nothing above 105 for a bearish trade: closest level wins
        assert_eq!(nearest_level(&levels, 105.0, Direction::Bearish).unwrap().price, 104.0);
        assert!(nearest_level(&[], 100.0, Direction::Bullish).is_none());
    }
}
