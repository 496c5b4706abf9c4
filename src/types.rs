//! Core data types used across the decision engine

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for bar data
#[derive(Debug, Error)]
pub enum BarValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("open ({open}) must be between low ({low}) and high ({high})")]
    OpenOutOfRange { open: f64, low: f64, high: f64 },

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLCV price bar for one closed interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Create a new bar with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarValidationError> {
        let bar = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Create a bar without validation (for trusted sources)
    pub fn new_unchecked(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate the bar data
    pub fn validate(&self) -> Result<(), BarValidationError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(BarValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(BarValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.volume < 0.0 {
            return Err(BarValidationError::NegativeVolume(self.volume));
        }

        if self.open < self.low || self.open > self.high {
            return Err(BarValidationError::OpenOutOfRange {
                open: self.open,
                low: self.low,
                high: self.high,
            });
        }

        if self.close < self.low || self.close > self.high {
            return Err(BarValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        Ok(())
    }

    /// Typical price: (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// True range relative to the previous bar's close
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Instrument symbol using Arc<str> for cheap cloning
///
/// Symbols are cloned into every intent and diagnostic; Arc<str> keeps that
/// O(1) instead of a heap copy per clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(#[serde(with = "arc_str_serde")] std::sync::Arc<str>);

/// Custom serde for Arc<str>
mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s.as_str()))
    }
}

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(std::sync::Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Classified market regime
///
/// `Undefined` is the sentinel for insufficient data or invalid inputs and is
/// never tradable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketContext {
    Undefined,
    TrendingUp,
    TrendingDown,
    Ranging,
}

impl MarketContext {
    /// True for the two tradable trend regimes
    pub fn is_trending(&self) -> bool {
        matches!(self, MarketContext::TrendingUp | MarketContext::TrendingDown)
    }

    /// Trade direction implied by the regime, if any
    pub fn trend_side(&self) -> Option<Side> {
        match self {
            MarketContext::TrendingUp => Some(Side::Buy),
            MarketContext::TrendingDown => Some(Side::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarketContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketContext::Undefined => write!(f, "undefined"),
            MarketContext::TrendingUp => write!(f, "trending-up"),
            MarketContext::TrendingDown => write!(f, "trending-down"),
            MarketContext::Ranging => write!(f, "ranging"),
        }
    }
}

/// Broker/symbol metadata, read-only input to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: Symbol,
    /// Smallest conventional price increment (e.g. 0.0001 for EURUSD)
    pub pip_size: f64,
    /// Account-currency value of one pip for one base unit
    pub pip_value: f64,
    /// Minimum tradable volume in base units
    pub volume_min: f64,
    /// Maximum tradable volume in base units
    pub volume_max: f64,
    /// Broker volume quantization step in base units
    pub volume_step: f64,
    /// Price decimal digits used for stop rounding
    pub digits: u32,
}

/// Host-supplied view of an open position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub id: u64,
    pub symbol: Symbol,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub volume: f64,
    pub label: String,
}

/// One-shot entry order produced by the engine, consumed by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: Symbol,
    pub side: Side,
    /// Broker-quantized volume in base units
    pub volume: f64,
    pub stop_loss_pips: f64,
    pub take_profit_pips: f64,
    pub label: String,
}

/// One-shot stop modification produced by the trailing pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopIntent {
    pub position_id: u64,
    pub new_stop_loss: f64,
}

/// Round a price to the symbol's quoted digits
///
/// Goes through Decimal so repeated stop recomputation cannot drift off the
/// broker's tick grid.
pub fn round_price(price: f64, digits: u32) -> f64 {
    Decimal::from_f64_retain(price)
        .map(|d| d.round_dp(digits))
        .and_then(|d| d.to_f64())
        .unwrap_or(price)
}
