//! Crossover-with-strength filter
//!
//! MACD histogram zero-cross between the previous and current bar, confirmed
//! by close sitting on the correct side of a long trend EMA and by ADX trend
//! strength. All three must agree for a confirmation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{adx, ema, macd};
use crate::{Bar, MarketContext, Side};

use super::SignalFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossoverFilterConfig {
    /// MACD fast EMA period (default: 12)
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    /// MACD slow EMA period (default: 26)
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    /// MACD signal EMA period (default: 9)
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Long trend EMA period (default: 100)
    #[serde(default = "default_trend_ema")]
    pub trend_ema: usize,

    /// ADX period (default: 14)
    #[serde(default = "default_adx_period")]
    pub adx_period: usize,

    /// Minimum ADX to accept any crossover (default: 25)
    #[serde(default = "default_min_strength")]
    pub min_strength: f64,
}

fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}
fn default_trend_ema() -> usize {
    100
}
fn default_adx_period() -> usize {
    14
}
fn default_min_strength() -> f64 {
    25.0
}

impl Default for CrossoverFilterConfig {
    fn default() -> Self {
        Self {
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            trend_ema: default_trend_ema(),
            adx_period: default_adx_period(),
            min_strength: default_min_strength(),
        }
    }
}

pub struct CrossoverFilter {
    config: CrossoverFilterConfig,
}

impl CrossoverFilter {
    pub fn new(config: CrossoverFilterConfig) -> Self {
        Self { config }
    }

    /// MACD histogram (line minus signal) for the previous and current bar
    fn last_two_histogram(&self, close: &[f64]) -> Option<(f64, f64)> {
        let (line, signal) = macd(
            close,
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        );
        let n = line.len();
        if n < 2 {
            return None;
        }
        let hist_at = |i: usize| -> Option<f64> {
            match (line[i], signal[i]) {
                (Some(l), Some(s)) => Some(l - s),
                _ => None,
            }
        };
        Some((hist_at(n - 2)?, hist_at(n - 1)?))
    }
}

impl SignalFilter for CrossoverFilter {
    fn name(&self) -> &'static str {
        "crossover"
    }

    fn confirms(&self, context: MarketContext, bars: &[Bar]) -> bool {
        let Some(side) = context.trend_side() else {
            return false;
        };

        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

        let Some(strength) = adx(&high, &low, &close, self.config.adx_period)
            .last()
            .copied()
            .flatten()
        else {
            return false;
        };
        if strength < self.config.min_strength {
            debug!(strength, min = self.config.min_strength, "crossover filter: trend too weak");
            return false;
        }

        let Some((prev_hist, curr_hist)) = self.last_two_histogram(&close) else {
            return false;
        };
        let crossed = match side {
            Side::Buy => prev_hist <= 0.0 && curr_hist > 0.0,
            Side::Sell => prev_hist >= 0.0 && curr_hist < 0.0,
        };
        if !crossed {
            return false;
        }

        let Some(trend) = ema(&close, self.config.trend_ema).last().copied().flatten() else {
            return false;
        };
        let last_close = close[close.len() - 1];
        let aligned = match side {
            Side::Buy => last_close > trend,
            Side::Sell => last_close < trend,
        };

        debug!(prev_hist, curr_hist, strength, trend, last_close, aligned, "crossover filter");
        aligned
    }
}
