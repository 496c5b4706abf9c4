//! Momentum-threshold classifier
//!
//! N-bar close-to-close change measured in pips against a fixed threshold.
//! Cheap and parameter-light compared to the channel classifier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Bar, MarketContext, SymbolSpec};

use super::ContextClassifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Bars to look back for the close delta (default: 10)
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Minimum absolute change in pips to call a trend (default: 20)
    #[serde(default = "default_threshold_pips")]
    pub threshold_pips: f64,
}

fn default_lookback() -> usize {
    10
}
fn default_threshold_pips() -> f64 {
    20.0
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            threshold_pips: default_threshold_pips(),
        }
    }
}

pub struct MomentumClassifier {
    config: MomentumConfig,
}

impl MomentumClassifier {
    pub fn new(config: MomentumConfig) -> Self {
        Self { config }
    }
}

impl ContextClassifier for MomentumClassifier {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn classify(&self, bars: &[Bar], spec: &SymbolSpec) -> MarketContext {
        if spec.pip_size <= 0.0 || self.config.lookback == 0 {
            return MarketContext::Undefined;
        }
        if bars.len() < self.config.lookback + 1 {
            return MarketContext::Undefined;
        }

        let now = bars[bars.len() - 1].close;
        let then = bars[bars.len() - 1 - self.config.lookback].close;
        let change_pips = (now - then) / spec.pip_size;

        let context = if change_pips > self.config.threshold_pips {
            MarketContext::TrendingUp
        } else if change_pips < -self.config.threshold_pips {
            MarketContext::TrendingDown
        } else {
            MarketContext::Ranging
        };

        debug!(change_pips, threshold = self.config.threshold_pips, %context, "momentum classification");
        context
    }
}
