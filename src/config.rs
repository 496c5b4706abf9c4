//! Configuration management
//!
//! JSON configuration for the engine: symbol metadata for the replay driver,
//! risk parameters, session gating, and the tagged classifier / filter /
//! reaction sections that select the decision policies.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::admission::SessionConfig;
use crate::context::ClassifierConfig;
use crate::filters::FilterConfig;
use crate::reaction::ReactionConfig;
use crate::sizing::RiskParameters;
use crate::SymbolSpec;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Label attached to every order this engine emits
    #[serde(default = "default_label")]
    pub label: String,

    /// Symbol metadata used by the replay driver; live hosts pass their own
    pub symbol: SymbolSpec,

    /// Primary and higher-timeframe history capacity in bars
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    pub risk: RiskParameters,

    /// Trailing distance in pips; 0 disables trailing
    #[serde(default)]
    pub trailing_stop_pips: f64,

    #[serde(default)]
    pub session: SessionConfig,

    pub classifier: ClassifierConfig,

    /// Optional confirmation filter; absent means unconditional confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterConfig>,

    /// Optional breakout/reaction entry timing; absent means direct trend
    /// entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionConfig>,
}

fn default_label() -> String {
    "fx-strategies".to_string()
}

fn default_history_capacity() -> usize {
    500
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"{
        "label": "trend-bot",
        "symbol": {
            "symbol": "EURUSD",
            "pip_size": 0.0001,
            "pip_value": 0.0001,
            "volume_min": 1000.0,
            "volume_max": 1000000.0,
            "volume_step": 1000.0,
            "digits": 5
        },
        "history_capacity": 300,
        "risk": { "risk_percent": 1.0, "stop_loss_pips": 20.0, "take_profit_pips": 40.0 },
        "trailing_stop_pips": 15.0,
        "session": { "session_start": "08:00:00", "session_end": "17:00:00", "one_trade_per_day": true },
        "classifier": { "name": "momentum", "lookback": 10, "threshold_pips": 20.0 },
        "filter": { "name": "oscillator", "period": 14, "buy_threshold": 55.0, "sell_threshold": 45.0 },
        "reaction": { "fractal_window": 2, "reaction_pct": 0.1, "timeout_minutes": 240 }
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = serde_json::from_str(FULL_CONFIG).unwrap();
        assert_eq!(config.label, "trend-bot");
        assert_eq!(config.history_capacity, 300);
        assert_eq!(config.trailing_stop_pips, 15.0);
        assert!(config.filter.is_some());
        assert!(config.reaction.is_some());
        assert!(matches!(config.classifier, ClassifierConfig::Momentum(_)));
    }

    #[test]
    fn test_minimal_config_defaults() {
        let json = r#"{
            "symbol": {
                "symbol": "EURUSD",
                "pip_size": 0.0001,
                "pip_value": 0.0001,
                "volume_min": 1000.0,
                "volume_max": 1000000.0,
                "volume_step": 1000.0,
                "digits": 5
            },
            "risk": { "risk_percent": 1.0, "stop_loss_pips": 20.0, "take_profit_pips": 40.0 },
            "classifier": { "name": "channel_slope" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.label, "fx-strategies");
        assert_eq!(config.history_capacity, 500);
        assert_eq!(config.trailing_stop_pips, 0.0);
        assert!(config.filter.is_none());
        assert!(config.reaction.is_none());
        assert!(config.session.one_trade_per_day);
    }

    #[test]
    fn test_config_round_trip() {
        let config: Config = serde_json::from_str(FULL_CONFIG).unwrap();
        let serialized = serde_json::to_string(&config).unwrap();
        let reparsed: Config = serde_json::from_str(&serialized).unwrap();
        assert_eq!(reparsed.label, config.label);
        assert_eq!(reparsed.risk.stop_loss_pips, config.risk.stop_loss_pips);
    }
}
