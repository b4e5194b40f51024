//! Setup Lifecycle
//!
//! A setup is opened when a v2 evaluation scores well enough, grades at least
//! Decent, and a trade plan exists. It then moves through:
//!
//! Forming → Ready → Triggered
//!
//! and can leave early to Invalidated (stop breached, direction flipped, or
//! the grade fell to Dumb Shit) or Expired (TTL elapsed). Triggered,
//! Invalidated and Expired are terminal.
//!
//! Every transition returns a new value; the caller stores it.

use crate::config::SetupConfig;
use crate::scoring::trade_params::TradeParameters;
use crate::types::{Direction, Grade, Ltp2Score};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupStage {
    /// Scored Decent, waiting for Sniper
    Forming,
    /// Sniper, waiting for price to move through entry
    Ready,
    Triggered,
    Invalidated,
    Expired,
}

impl SetupStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SetupStage::Triggered | SetupStage::Invalidated | SetupStage::Expired
        )
    }
}

impl std::fmt::Display for SetupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupStage::Forming => write!(f, "forming"),
            SetupStage::Ready => write!(f, "ready"),
            SetupStage::Triggered => write!(f, "triggered"),
            SetupStage::Invalidated => write!(f, "invalidated"),
            SetupStage::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedSetup {
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub stage: SetupStage,
    /// Grade and score of the latest evaluation applied
    pub grade: Grade,
    pub score: f64,
    pub confidence: f64,
    pub trade: TradeParameters,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidation_reason: Option<String>,
}

impl DetectedSetup {
    /// Open a setup from an evaluation, if it qualifies
    pub fn detect(
        symbol: &str,
        score: &Ltp2Score,
        trade: Option<&TradeParameters>,
        now: DateTime<Utc>,
        config: &SetupConfig,
    ) -> Option<Self> {
        // The stage follows the smoothed grade, so a Dumb Shit grade never opens
        if score.score < config.min_setup_score || score.grade == Grade::DumbShit {
            return None;
        }
        let trade = trade?;

        let stage = if score.grade == Grade::Sniper {
            SetupStage::Ready
        } else {
            SetupStage::Forming
        };

        let setup = Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            direction: score.direction,
            stage,
            grade: score.grade,
            score: score.score,
            confidence: score.confidence,
            trade: *trade,
            detected_at: now,
            updated_at: now,
            expires_at: now + Duration::minutes(config.ttl_minutes),
            invalidation_reason: None,
        };

        info!(
            "Setup {} {} {} opened as {} (score {:.0}, {})",
            setup.id, setup.symbol, setup.direction, setup.stage, setup.score, setup.trade
        );

        Some(setup)
    }

    /// Apply a fresh evaluation and price, returning the next value
    pub fn advance(
        &self,
        score: &Ltp2Score,
        price: f64,
        now: DateTime<Utc>,
        config: &SetupConfig,
    ) -> Self {
        if self.stage.is_terminal() {
            return self.clone();
        }

        let mut next = Self {
            grade: score.grade,
            score: score.score,
            confidence: score.confidence,
            updated_at: now,
            ..self.clone()
        };

        if now >= self.expires_at {
            next.stage = SetupStage::Expired;
        } else if let Some(reason) = self.invalidation(score, price) {
            next.stage = SetupStage::Invalidated;
            next.invalidation_reason = Some(reason);
        } else if self.stage == SetupStage::Forming && score.grade == Grade::Sniper {
            next.stage = SetupStage::Ready;
        } else if self.stage == SetupStage::Ready && self.triggered(price, config) {
            next.stage = SetupStage::Triggered;
        }

        if next.stage != self.stage {
            info!(
                "Setup {} {}: {} → {}{}",
                self.id,
                self.symbol,
                self.stage,
                next.stage,
                next.invalidation_reason
                    .as_deref()
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default()
            );
        }

        next
    }

    fn invalidation(&self, score: &Ltp2Score, price: f64) -> Option<String> {
        if self.trade.stop_breached(price, self.direction) {
            Some(format!("price {:.2} breached stop {:.2}", price, self.trade.stop))
        } else if score.direction != self.direction {
            Some(format!("direction flipped to {}", score.direction))
        } else if score.grade == Grade::DumbShit {
            Some(format!("grade fell to {}", score.grade))
        } else {
            None
        }
    }

    fn triggered(&self, price: f64, config: &SetupConfig) -> bool {
        let buffer = self.trade.entry * config.trigger_buffer_pct / 100.0;
        match self.direction {
            Direction::Bullish => price >= self.trade.entry + buffer,
            Direction::Bearish => price <= self.trade.entry - buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreBreakdown;
    use chrono::TimeZone;

    fn score(value: f64, grade: Grade, direction: Direction) -> Ltp2Score {
        Ltp2Score {
            score: value,
            grade,
            direction,
            confidence: 80.0,
            breakdown: ScoreBreakdown::default(),
            warnings: Vec::new(),
            recommendation: String::new(),
            stability: None,
        }
    }

    fn trade() -> TradeParameters {
        TradeParameters {
            entry: 100.0,
            stop: 97.0,
            target1: 103.0,
            target2: 106.0,
            target3: 109.0,
            risk_reward: 2.0,
            heuristic_volatility: 1.0,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_detect_thresholds() {
        let config = SetupConfig::default();
        let low = score(45.0, Grade::DumbShit, Direction::Bullish);
        assert!(DetectedSetup::detect("SPY", &low, Some(&trade()), t0(), &config).is_none());

        let decent = score(60.0, Grade::Decent, Direction::Bullish);
        assert!(DetectedSetup::detect("SPY", &decent, None, t0(), &config).is_none());
        let forming = DetectedSetup::detect("SPY", &decent, Some(&trade()), t0(), &config).unwrap();
        assert_eq!(forming.stage, SetupStage::Forming);
        assert_eq!(forming.expires_at, t0() + Duration::minutes(30));

        let sniper = score(85.0, Grade::Sniper, Direction::Bullish);
        let ready = DetectedSetup::detect("SPY", &sniper, Some(&trade()), t0(), &config).unwrap();
        assert_eq!(ready.stage, SetupStage::Ready);
        assert_ne!(ready.id, forming.id);
    }

    #[test]
    fn test_high_raw_score_with_dumb_shit_grade_does_not_open() {
        let config = SetupConfig::default();
        // Raw 73 smoothed down by a weak history
        let smoothed_down = score(73.0, Grade::DumbShit, Direction::Bullish);
        assert!(DetectedSetup::detect("SPY", &smoothed_down, Some(&trade()), t0(), &config).is_none());
    }

    #[test]
    fn test_forming_to_ready_to_triggered() {
        let config = SetupConfig::default();
        let decent = score(60.0, Grade::Decent, Direction::Bullish);
        let sniper = score(80.0, Grade::Sniper, Direction::Bullish);
        let setup = DetectedSetup::detect("SPY", &decent, Some(&trade()), t0(), &config).unwrap();

        let ready = setup.advance(&sniper, 100.0, t0() + Duration::minutes(5), &config);
        assert_eq!(ready.stage, SetupStage::Ready);
        assert_eq!(ready.grade, Grade::Sniper);
        assert_eq!(setup.stage, SetupStage::Forming);

        // 0.05% is not enough
        let waiting = ready.advance(&sniper, 100.05, t0() + Duration::minutes(6), &config);
        assert_eq!(waiting.stage, SetupStage::Ready);

        let triggered = waiting.advance(&sniper, 100.2, t0() + Duration::minutes(7), &config);
        assert_eq!(triggered.stage, SetupStage::Triggered);

        // Terminal stages stay put
        let after = triggered.advance(&score(10.0, Grade::DumbShit, Direction::Bearish), 90.0, t0() + Duration::hours(2), &config);
        assert_eq!(after, triggered);
    }

    #[test]
    fn test_invalidation() {
        let config = SetupConfig::default();
        let sniper = score(80.0, Grade::Sniper, Direction::Bullish);
        let setup = DetectedSetup::detect("SPY", &sniper, Some(&trade()), t0(), &config).unwrap();
        let later = t0() + Duration::minutes(1);

        let stopped = setup.advance(&sniper, 96.5, later, &config);
        assert_eq!(stopped.stage, SetupStage::Invalidated);
        assert!(stopped.invalidation_reason.unwrap().contains("stop"));

        let flipped = setup.advance(&score(80.0, Grade::Sniper, Direction::Bearish), 99.0, later, &config);
        assert_eq!(flipped.stage, SetupStage::Invalidated);

        let degraded = setup.advance(&score(30.0, Grade::DumbShit, Direction::Bullish), 99.0, later, &config);
        assert_eq!(degraded.stage, SetupStage::Invalidated);
    }

    #[test]
    fn test_expiry_wins() {
        let config = SetupConfig::default();
        let sniper = score(80.0, Grade::Sniper, Direction::Bullish);
        let setup = DetectedSetup::detect("SPY", &sniper, Some(&trade()), t0(), &config).unwrap();
        let expired = setup.advance(&sniper, 101.0, t0() + Duration::minutes(30), &config);
        assert_eq!(expired.stage, SetupStage::Expired);
    }
}
