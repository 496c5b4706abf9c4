//! Signal confirmation filters
//!
//! Optional layer gating a raw context signal before the entry path runs.
//! Absence of a configured filter is equivalent to unconditional
//! confirmation; the engine treats a missing `filter` section as pass-through.

pub mod crossover;
pub mod oscillator;

use serde::{Deserialize, Serialize};

use crate::{Bar, MarketContext};

pub use crossover::{CrossoverFilter, CrossoverFilterConfig};
pub use oscillator::{OscillatorFilter, OscillatorFilterConfig};

/// Signal confirmation policy
pub trait SignalFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// True when the filter confirms an entry in the direction of `context`
    ///
    /// Non-trending contexts are never confirmed.
    fn confirms(&self, context: MarketContext, bars: &[Bar]) -> bool;
}

/// Filter selection, tagged by `name` in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum FilterConfig {
    Oscillator(OscillatorFilterConfig),
    Crossover(CrossoverFilterConfig),
}

impl FilterConfig {
    /// Build the configured filter
    pub fn create(&self) -> Box<dyn SignalFilter> {
        match self {
            FilterConfig::Oscillator(cfg) => Box::new(OscillatorFilter::new(cfg.clone())),
            FilterConfig::Crossover(cfg) => Box::new(CrossoverFilter::new(cfg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_config_selection() {
        let json = r#"{ "name": "oscillator", "period": 14, "buy_threshold": 55.0, "sell_threshold": 45.0 }"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.create().name(), "oscillator");

        let json = r#"{ "name": "crossover" }"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.create().name(), "crossover");
    }
}
