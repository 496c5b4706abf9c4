//! Channel-slope classifier
//!
//! Keltner-style channel around an EMA of typical price, with the EMA slope
//! deciding trend direction. Breakouts beyond the channel in the slope
//! direction classify as trending; a flat slope inside the channel is ranging.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{ema, wilder_atr};
use crate::{Bar, MarketContext, SymbolSpec};

use super::ContextClassifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSlopeConfig {
    /// EMA period over typical price (default: 20)
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,

    /// ATR period, Wilder smoothing (default: 10)
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Channel half-width in ATR multiples (default: 2.0)
    #[serde(default = "default_channel_mult")]
    pub channel_mult: f64,
}

fn default_ema_period() -> usize {
    20
}
fn default_atr_period() -> usize {
    10
}
fn default_channel_mult() -> f64 {
    2.0
}

impl Default for ChannelSlopeConfig {
    fn default() -> Self {
        Self {
            ema_period: default_ema_period(),
            atr_period: default_atr_period(),
            channel_mult: default_channel_mult(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slope {
    Rising,
    Falling,
    Flat,
}

pub struct ChannelSlopeClassifier {
    config: ChannelSlopeConfig,
}

impl ChannelSlopeClassifier {
    pub fn new(config: ChannelSlopeConfig) -> Self {
        Self { config }
    }

    /// Slope over the last three EMA values: strictly monotone or flat
    fn slope(ema_values: &[Option<f64>]) -> Option<Slope> {
        let defined: Vec<f64> = ema_values.iter().filter_map(|&v| v).collect();
        if defined.len() < 3 {
            return None;
        }
        let tail = &defined[defined.len() - 3..];
        if tail.iter().tuple_windows().all(|(a, b)| b > a) {
            Some(Slope::Rising)
        } else if tail.iter().tuple_windows().all(|(a, b)| b < a) {
            Some(Slope::Falling)
        } else {
            Some(Slope::Flat)
        }
    }
}

impl ContextClassifier for ChannelSlopeClassifier {
    fn name(&self) -> &'static str {
        "channel_slope"
    }

    fn classify(&self, bars: &[Bar], _spec: &SymbolSpec) -> MarketContext {
        let min_bars = self.config.ema_period.max(self.config.atr_period);
        if bars.len() < min_bars {
            return MarketContext::Undefined;
        }

        let typical: Vec<f64> = bars.iter().map(|b| b.typical_price()).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let ema_values = ema(&typical, self.config.ema_period);
        let atr_values = wilder_atr(&high, &low, &close, self.config.atr_period);

        let (Some(mid), Some(atr)) = (
            ema_values.last().copied().flatten(),
            atr_values.last().copied().flatten(),
        ) else {
            return MarketContext::Undefined;
        };
        let Some(slope) = Self::slope(&ema_values) else {
            return MarketContext::Undefined;
        };

        let upper = mid + self.config.channel_mult * atr;
        let lower = mid - self.config.channel_mult * atr;
        let last_close = close[close.len() - 1];
        let inside = last_close <= upper && last_close >= lower;

        let context = match slope {
            Slope::Rising if last_close > upper => MarketContext::TrendingUp,
            Slope::Falling if last_close < lower => MarketContext::TrendingDown,
            Slope::Flat if inside => MarketContext::Ranging,
            // Price back inside the channel keeps the slope's classification
            // while the slope persists (pullback within trend)
            Slope::Rising if inside => MarketContext::TrendingUp,
            Slope::Falling if inside => MarketContext::TrendingDown,
            _ => MarketContext::Ranging,
        };

        debug!(
            close = last_close,
            upper,
            lower,
            ?slope,
            %context,
            "channel-slope classification"
        );
        context
    }
}
