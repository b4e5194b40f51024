//! Gamma Wall Scoring
//!
//! Dealer hedging concentrates at the call wall (acts as resistance) and the
//! put wall (acts as support). Three components:
//! 1. Position - price on the supportive side of the near wall
//! 2. Regime - gamma exposure sign matches the direction
//! 3. Opposing wall penalty - graduated by distance to the wall in the way

use crate::config::GammaConfig;
use crate::scoring::math::{is_valid_price, percent_distance, valid_level};
use crate::types::{Direction, ScoreWarning, Severity};
use serde::{Deserialize, Serialize};

/// Gamma regime from the exposure sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaRegime {
    /// Dealers long gamma: moves get dampened
    Positive,
    /// Dealers short gamma: moves get amplified
    Negative,
}

impl GammaRegime {
    /// Regime a direction wants
    pub fn expected_for(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => GammaRegime::Positive,
            Direction::Bearish => GammaRegime::Negative,
        }
    }
}

impl std::fmt::Display for GammaRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GammaRegime::Positive => write!(f, "positive"),
            GammaRegime::Negative => write!(f, "negative"),
        }
    }
}

/// Points earned by one gamma component, with an optional warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GammaComponent {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ScoreWarning>,
}

impl GammaComponent {
    fn full(score: f64) -> Self {
        Self { score, warning: None }
    }

    fn zero(severity: Severity, message: String) -> Self {
        Self {
            score: 0.0,
            warning: Some(ScoreWarning::new(severity, message)),
        }
    }
}

/// Opposing wall deduction (zero or negative)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallPenalty {
    pub penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ScoreWarning>,
}

/// Full weight when price sits on the supportive side of the near wall:
/// above the put wall for bullish, below the call wall for bearish.
pub fn score_gamma_wall_position(
    price: f64,
    call_wall: Option<f64>,
    put_wall: Option<f64>,
    direction: Direction,
    max_weight: f64,
) -> GammaComponent {
    let (wall, wall_name) = match direction {
        Direction::Bullish => (valid_level(put_wall), "put wall"),
        Direction::Bearish => (valid_level(call_wall), "call wall"),
    };

    let Some(wall) = wall else {
        return GammaComponent::zero(
            Severity::Info,
            format!("No {} data - gamma position not scored", wall_name),
        );
    };

    let supported = match direction {
        Direction::Bullish => price > wall,
        Direction::Bearish => price < wall,
    };

    if supported {
        GammaComponent::full(max_weight)
    } else {
        let side = match direction {
            Direction::Bullish => "below",
            Direction::Bearish => "above",
        };
        GammaComponent::zero(
            Severity::High,
            format!(
                "Price {:.2} is {} the {} {:.2} - no dealer support for {} trade",
                price, side, wall_name, wall, direction
            ),
        )
    }
}

/// Regime implied by the exposure sign, else by price vs the zero-gamma level
pub fn determine_gamma_regime(
    gamma_exposure: Option<f64>,
    zero_gamma: Option<f64>,
    price: f64,
) -> Option<GammaRegime> {
    match gamma_exposure.filter(|g| g.is_finite()) {
        Some(g) if g > 0.0 => Some(GammaRegime::Positive),
        Some(g) if g < 0.0 => Some(GammaRegime::Negative),
        Some(_) => None,
        None => valid_level(zero_gamma)
            .filter(|_| is_valid_price(price))
            .and_then(|flip| {
                if price > flip {
                    Some(GammaRegime::Positive)
                } else if price < flip {
                    Some(GammaRegime::Negative)
                } else {
                    None
                }
            }),
    }
}

/// Full weight when the regime matches the one `direction` expects
pub fn score_gamma_regime(
    gamma_exposure: Option<f64>,
    zero_gamma: Option<f64>,
    price: f64,
    direction: Direction,
    max_weight: f64,
) -> GammaComponent {
    let expected = GammaRegime::expected_for(direction);

    match determine_gamma_regime(gamma_exposure, zero_gamma, price) {
        Some(regime) if regime == expected => GammaComponent::full(max_weight),
        Some(regime) => GammaComponent::zero(
            Severity::Moderate,
            format!(
                "Gamma regime is {} - expected {} for a {} trade",
                regime, expected, direction
            ),
        ),
        None => GammaComponent::zero(
            Severity::Info,
            "Gamma exposure unavailable or flat - regime not scored".to_string(),
        ),
    }
}

/// Graduated deduction for the wall standing in the trade's way: the call
/// wall for bullish trades, the put wall for bearish ones.
pub fn calculate_opposing_wall_penalty(
    price: f64,
    call_wall: Option<f64>,
    put_wall: Option<f64>,
    direction: Direction,
    max_penalty: f64,
    config: &GammaConfig,
) -> WallPenalty {
    let (wall, wall_name, role) = match direction {
        Direction::Bullish => (valid_level(call_wall), "Call wall", "resistance"),
        Direction::Bearish => (valid_level(put_wall), "Put wall", "support"),
    };

    let Some(wall) = wall.filter(|_| is_valid_price(price)) else {
        return WallPenalty {
            penalty: 0.0,
            distance_pct: None,
            warning: None,
        };
    };

    let distance_pct = percent_distance(wall, price).abs();

    let tier = config
        .penalty_distance_pcts
        .iter()
        .position(|threshold| distance_pct >= *threshold);

    let (penalty, severity) = match tier {
        Some(0) => (config.penalty_points[0], None),
        Some(1) => (config.penalty_points[1], Some(Severity::Low)),
        Some(2) => (config.penalty_points[2], Some(Severity::Moderate)),
        Some(i) => (config.penalty_points[i], Some(Severity::High)),
        None => (-max_penalty, Some(Severity::Critical)),
    };

    let penalty = penalty.max(-max_penalty).min(0.0);

    let warning = severity.map(|severity| {
        let qualifier = match severity {
            Severity::Critical => "pinned against",
            Severity::High => "very close to",
            Severity::Moderate => "approaching",
            _ => "within reach of",
        };
        ScoreWarning::new(
            severity,
            format!(
                "{} {:.2} is {:.2}% away - price is {} {} ({:+} pts)",
                wall_name, wall, distance_pct, qualifier, role, penalty
            ),
        )
    });

    WallPenalty {
        penalty,
        distance_pct: Some(distance_pct),
        warning,
    }
}
