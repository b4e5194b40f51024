//! Error types for the scoring core
//!
//! Malformed or sparse market data never produces an error (it degrades to
//! empty/neutral results). Errors are reserved for caller contract violations.

/// Contract violations raised by the scoring core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Invalid EMA period: {0} (must be at least 1)")]
    InvalidPeriod(usize),

    #[error("Invalid scoring config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("No market context for {symbol}: supply a context or at least 2 bars (got {bars})")]
    MissingContext { symbol: String, bars: usize },
}

pub type ScoringResult<T> = std::result::Result<T, ScoringError>;
