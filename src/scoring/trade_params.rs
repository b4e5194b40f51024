//! Entry / stop / target derivation from a key level

use crate::config::TradeConfig;
use crate::scoring::math::{is_valid_price, safe_divide};
use crate::types::{Direction, KeyLevel};
use serde::{Deserialize, Serialize};

/// Trade plan for one setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeParameters {
    pub entry: f64,
    pub stop: f64,
    pub target1: f64,
    pub target2: f64,
    pub target3: f64,
    /// |target2 - entry| / |entry - stop|, 0 when there is no risk
    pub risk_reward: f64,
    /// Fixed percentage of price used as the stop buffer (not an ATR)
    pub heuristic_volatility: f64,
}

impl TradeParameters {
    /// |entry - stop|
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop).abs()
    }

    /// True when `price` has crossed the stop against `direction`
    pub fn stop_breached(&self, price: f64, direction: Direction) -> bool {
        match direction {
            Direction::Bullish => price <= self.stop,
            Direction::Bearish => price >= self.stop,
        }
    }
}

impl std::fmt::Display for TradeParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "entry {:.2} | stop {:.2} | targets {:.2} / {:.2} / {:.2} | R:R {:.2}",
            self.entry, self.stop, self.target1, self.target2, self.target3, self.risk_reward
        )
    }
}

/// Build a trade plan around `level`.
///
/// The stop sits one heuristic volatility beyond the level (below for
/// bullish, above for bearish). No level, or an unusable price, yields `None`.
pub fn calculate_trade_parameters(
    current_price: f64,
    level: Option<&KeyLevel>,
    direction: Direction,
    config: &TradeConfig,
) -> Option<TradeParameters> {
    let level = level.filter(|l| is_valid_price(l.price))?;
    if !is_valid_price(current_price) {
        return None;
    }

    let entry = current_price;
    let heuristic_volatility = current_price * config.heuristic_volatility_pct;
    let stop = level.price - direction.sign() * heuristic_volatility;

    let risk = (entry - stop).abs();
    let [m1, m2, m3] = config.target_multiples;
    let target = |multiple: f64| entry + direction.sign() * risk * multiple;
    let target2 = target(m2);

    Some(TradeParameters {
        entry,
        stop,
        target1: target(m1),
        target2,
        target3: target(m3),
        risk_reward: safe_divide((target2 - entry).abs(), risk),
        heuristic_volatility,
    })
}
