//! Grade Hysteresis
//!
//! Suppresses grade flapping when the raw score hovers around a threshold:
//! - The raw score is smoothed with the last few raw scores from the state
//! - A held grade only drops once the smoothed score falls below its
//!   threshold minus the buffer (strict `<`)
//! - Upgrades use the plain thresholds
//!
//! The state is owned by the caller. This module never mutates it and always
//! returns a fresh value to store for the next evaluation.

use crate::config::GradeConfig;
use crate::types::{Grade, ScoreHysteresisState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Grade decision for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HysteresisOutcome {
    pub grade: Grade,
    pub smoothed_score: f64,
    /// Held by the buffer rather than earned outright
    pub grade_locked: bool,
    pub candles_at_grade: u32,
    pub previous_grade: Option<Grade>,
    pub next_state: ScoreHysteresisState,
}

/// Plain threshold grading, no memory
pub fn grade_for_score(score: f64, config: &GradeConfig) -> Grade {
    if score >= config.sniper_threshold {
        Grade::Sniper
    } else if score >= config.decent_threshold {
        Grade::Decent
    } else {
        Grade::DumbShit
    }
}

/// round(mean(last `smoothing_window` previous raw scores + `raw`))
pub fn smoothed_score(raw: f64, previous_scores: &[f64], config: &GradeConfig) -> f64 {
    let start = previous_scores.len().saturating_sub(config.smoothing_window);
    let window = &previous_scores[start..];
    let sum: f64 = window.iter().sum::<f64>() + raw;
    (sum / (window.len() + 1) as f64).round()
}

/// Grade for `smoothed` given the grade currently held.
/// Returns the grade and whether the buffer held it.
fn graded_with_buffer(smoothed: f64, held: Option<Grade>, config: &GradeConfig) -> (Grade, bool) {
    let plain = grade_for_score(smoothed, config);
    let buffer = config.hysteresis_buffer;

    match held {
        Some(Grade::Sniper) => {
            if smoothed < config.sniper_threshold - buffer {
                (plain, false)
            } else {
                (Grade::Sniper, smoothed < config.sniper_threshold)
            }
        }
        Some(Grade::Decent) => {
            if smoothed >= config.sniper_threshold {
                (Grade::Sniper, false)
            } else if smoothed < config.decent_threshold - buffer {
                (Grade::DumbShit, false)
            } else {
                (Grade::Decent, smoothed < config.decent_threshold)
            }
        }
        _ => (plain, false),
    }
}

/// Apply smoothing and the hysteresis buffer to a raw score.
///
/// With no previous state the raw score is graded on plain thresholds.
pub fn apply_hysteresis(
    raw_score: f64,
    previous: Option<&ScoreHysteresisState>,
    config: &GradeConfig,
) -> HysteresisOutcome {
    let history: &[f64] = previous.map(|s| s.previous_scores.as_slice()).unwrap_or(&[]);
    let held = previous.map(|s| s.previous_grade);

    let smoothed = smoothed_score(raw_score, history, config);
    let (grade, grade_locked) = graded_with_buffer(smoothed, held, config);

    let candles_at_grade = match previous {
        Some(state) if state.previous_grade == grade => state.candles_at_grade.saturating_add(1),
        _ => 1,
    };

    let keep_from = (history.len() + 1).saturating_sub(config.history_limit);
    let previous_scores: Vec<f64> = history
        .iter()
        .copied()
        .chain(std::iter::once(raw_score))
        .skip(keep_from)
        .collect();

    match held {
        Some(old) if old != grade => {
            info!("Grade change: {} → {} (raw {:.0}, smoothed {:.0})", old, grade, raw_score, smoothed)
        }
        _ => debug!(
            "Grade {} held (raw {:.0}, smoothed {:.0}, locked={}, candles={})",
            grade, raw_score, smoothed, grade_locked, candles_at_grade
        ),
    }

    HysteresisOutcome {
        grade,
        smoothed_score: smoothed,
        grade_locked,
        candles_at_grade,
        previous_grade: held,
        next_state: ScoreHysteresisState {
            previous_grade: grade,
            previous_scores,
            candles_at_grade,
        },
    }
}
