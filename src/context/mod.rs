//! Market context classification
//!
//! Maps recent bar history to a market regime. Two interchangeable policies
//! are provided behind the `ContextClassifier` trait, selected by the tagged
//! `classifier` section of the configuration.

pub mod channel_slope;
pub mod momentum;

use serde::{Deserialize, Serialize};

use crate::{Bar, MarketContext, SymbolSpec};

pub use channel_slope::{ChannelSlopeClassifier, ChannelSlopeConfig};
pub use momentum::{MomentumClassifier, MomentumConfig};

/// Market context classification policy
pub trait ContextClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Classify the current regime from the ordered bar history
    ///
    /// Returns `MarketContext::Undefined` when the history is shorter than
    /// the policy's minimum window or inputs are invalid.
    fn classify(&self, bars: &[Bar], spec: &SymbolSpec) -> MarketContext;
}

/// Classifier selection, tagged by `name` in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ClassifierConfig {
    ChannelSlope(ChannelSlopeConfig),
    Momentum(MomentumConfig),
}

impl ClassifierConfig {
    /// Build the configured classifier
    pub fn create(&self) -> Box<dyn ContextClassifier> {
        match self {
            ClassifierConfig::ChannelSlope(cfg) => Box::new(ChannelSlopeClassifier::new(cfg.clone())),
            ClassifierConfig::Momentum(cfg) => Box::new(MomentumClassifier::new(cfg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_config_selection() {
        let json = r#"{ "name": "momentum", "lookback": 10, "threshold_pips": 20.0 }"#;
        let config: ClassifierConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.create().name(), "momentum");

        let json = r#"{ "name": "channel_slope", "ema_period": 20, "atr_period": 10, "channel_mult": 2.0 }"#;
        let config: ClassifierConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.create().name(), "channel_slope");
    }
}
