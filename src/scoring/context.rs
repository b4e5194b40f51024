//! Build a `MarketContext` from a bar series plus gamma data

use crate::config::CloudConfig;
use crate::scoring::trend::calculate_ema_of_closes;
use crate::scoring::vwap::calculate_vwap;
use crate::types::{Bar, GammaSnapshot, MarketContext};
use tracing::warn;

impl MarketContext {
    /// Derive a context from session bars (oldest first).
    ///
    /// EMAs are over closes with the configured periods, VWAP over the whole
    /// slice. The last two bars become the patience candidates. Fewer than
    /// two bars yields `None`.
    pub fn from_bars(bars: &[Bar], gamma: &GammaSnapshot, config: &CloudConfig) -> Option<Self> {
        let [.., previous, current] = bars else {
            return None;
        };

        let ema8 = calculate_ema_of_closes(bars, config.ema_fast);
        let ema21 = calculate_ema_of_closes(bars, config.ema_slow);
        let (ema8, ema21) = match (ema8, ema21) {
            (Ok(fast), Ok(slow)) => (fast, slow),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Context build failed: {}", e);
                return None;
            }
        };

        if bars.len() < config.ema_slow {
            warn!(
                "Only {} bars for EMA{} - cloud uses the short-series fallback",
                bars.len(),
                config.ema_slow
            );
        }

        let vwap = calculate_vwap(bars);
        if vwap == 0.0 {
            warn!("Session volume is zero - VWAP unavailable");
        }

        Some(MarketContext {
            current_price: current.close,
            previous_close: previous.close,
            ema8,
            ema21,
            vwap,
            call_wall: gamma.call_wall,
            put_wall: gamma.put_wall,
            zero_gamma: gamma.zero_gamma,
            gamma_exposure: gamma.gamma_exposure,
            patience_detected: false,
            patience_direction: None,
            previous_bar: Some(*previous),
            current_bar: Some(*current),
        })
    }
}
