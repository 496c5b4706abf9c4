//! Oscillator-threshold filter
//!
//! RSI over closes against asymmetric buy/sell thresholds. A buy is confirmed
//! only with the oscillator above the buy threshold, a sell only below the
//! sell threshold.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::rsi;
use crate::{Bar, MarketContext};

use super::SignalFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscillatorFilterConfig {
    /// RSI period (default: 14)
    #[serde(default = "default_period")]
    pub period: usize,

    /// Minimum oscillator value to confirm a buy (default: 55)
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: f64,

    /// Maximum oscillator value to confirm a sell (default: 45)
    #[serde(default = "default_sell_threshold")]
    pub sell_threshold: f64,
}

fn default_period() -> usize {
    14
}
fn default_buy_threshold() -> f64 {
    55.0
}
fn default_sell_threshold() -> f64 {
    45.0
}

impl Default for OscillatorFilterConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            buy_threshold: default_buy_threshold(),
            sell_threshold: default_sell_threshold(),
        }
    }
}

pub struct OscillatorFilter {
    config: OscillatorFilterConfig,
}

impl OscillatorFilter {
    pub fn new(config: OscillatorFilterConfig) -> Self {
        Self { config }
    }
}

impl SignalFilter for OscillatorFilter {
    fn name(&self) -> &'static str {
        "oscillator"
    }

    fn confirms(&self, context: MarketContext, bars: &[Bar]) -> bool {
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let Some(value) = rsi(&close, self.config.period).last().copied().flatten() else {
            return false;
        };

        let confirmed = match context {
            MarketContext::TrendingUp => value > self.config.buy_threshold,
            MarketContext::TrendingDown => value < self.config.sell_threshold,
            _ => false,
        };

        debug!(oscillator = value, %context, confirmed, "oscillator filter");
        confirmed
    }
}
