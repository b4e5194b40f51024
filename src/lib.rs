// Library crate - LTP setup scoring core

pub mod config;
pub mod error;
pub mod scoring;
pub mod types;

// Re-export commonly used types
pub use config::ScoringConfig;
pub use error::{ScoringError, ScoringResult};
pub use types::*;
