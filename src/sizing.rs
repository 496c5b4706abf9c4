//! Risk-based position sizing
//!
//! Converts a fractional risk budget and stop distance into a
//! broker-quantized volume. Quantization runs in Decimal so floor-to-step on
//! large unit counts cannot pick up float drift.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::SymbolSpec;

/// Per-trade risk parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Fraction of balance risked per trade, in percent (0 < r <= 100)
    pub risk_percent: f64,
    /// Stop-loss distance in pips
    pub stop_loss_pips: f64,
    /// Take-profit distance in pips
    pub take_profit_pips: f64,
}

/// Sizing failures; all abort the trade path without touching session state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("invalid risk inputs: risk_percent={risk_percent}, risk_per_unit={risk_per_unit}")]
    InvalidRisk {
        risk_percent: f64,
        risk_per_unit: f64,
    },

    #[error("invalid broker volume configuration: step={step}")]
    InvalidConfig { step: f64 },

    #[error("minimum volume risks {required:.2} which exceeds the {budget:.2} budget")]
    Unaffordable { required: f64, budget: f64 },

    #[error("computed volume is not tradable")]
    ZeroVolume,
}

/// Fixed-fractional position sizer
#[derive(Debug, Clone, Default)]
pub struct PositionSizer;

impl PositionSizer {
    /// Compute the broker-quantized volume for one trade
    ///
    /// Realized risk never knowingly exceeds `balance * risk_percent / 100`;
    /// the one exception is the broker minimum, which is only used after the
    /// affordability check passes.
    pub fn size(
        &self,
        balance: f64,
        risk: &RiskParameters,
        spec: &SymbolSpec,
    ) -> Result<f64, SizingError> {
        if risk.risk_percent <= 0.0 || risk.risk_percent > 100.0 {
            return Err(SizingError::InvalidRisk {
                risk_percent: risk.risk_percent,
                risk_per_unit: 0.0,
            });
        }

        let risk_amount = balance * (risk.risk_percent / 100.0);
        let risk_per_unit = risk.stop_loss_pips * spec.pip_value;
        if risk_per_unit <= 0.0 {
            return Err(SizingError::InvalidRisk {
                risk_percent: risk.risk_percent,
                risk_per_unit,
            });
        }

        if spec.volume_step <= 0.0 {
            return Err(SizingError::InvalidConfig {
                step: spec.volume_step,
            });
        }

        let raw_units = risk_amount / risk_per_unit;
        let mut units = quantize_down(raw_units, spec.volume_step);

        if units < spec.volume_min {
            units = spec.volume_min;
            let required = spec.volume_min * risk_per_unit;
            if risk_amount > 0.0 && required > risk_amount {
                debug!(required, budget = risk_amount, "minimum volume not affordable");
                return Err(SizingError::Unaffordable {
                    required,
                    budget: risk_amount,
                });
            }
        }

        if units > spec.volume_max {
            units = spec.volume_max;
        }

        if units <= 0.0 {
            return Err(SizingError::ZeroVolume);
        }

        debug!(balance, risk_amount, raw_units, units, "position sized");
        Ok(units)
    }
}

/// Floor to the nearest multiple of `step`, exactly
fn quantize_down(value: f64, step: f64) -> f64 {
    let (Some(value), Some(step)) = (Decimal::from_f64(value), Decimal::from_f64(step)) else {
        return 0.0;
    };
    if step.is_zero() {
        return 0.0;
    }
    ((value / step).floor() * step).to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;

    fn spec(min: f64, max: f64, step: f64) -> SymbolSpec {
        SymbolSpec {
            symbol: Symbol::new("EURUSD"),
            pip_size: 0.0001,
            pip_value: 1.0,
            volume_min: min,
            volume_max: max,
            volume_step: step,
            digits: 5,
        }
    }

    fn risk(percent: f64, stop: f64) -> RiskParameters {
        RiskParameters {
            risk_percent: percent,
            stop_loss_pips: stop,
            take_profit_pips: stop * 2.0,
        }
    }

    #[test]
    fn test_basic_sizing() {
        // budget 100, 20 pips at 0.0001/pip-per-unit: raw 50k units, step-aligned
        let s = SymbolSpec {
            pip_value: 0.0001,
            ..spec(1000.0, 10_000_000.0, 1000.0)
        };
        let units = PositionSizer.size(10_000.0, &risk(1.0, 20.0), &s).unwrap();
        assert_eq!(units, 50_000.0);
    }

    #[test]
    fn test_quantization_floors() {
        let s = SymbolSpec {
            pip_value: 0.001,
            ..spec(1000.0, 100_000.0, 1000.0)
        };
        // raw = 110 / 0.02 = 5500 units, floored to the 1000-unit step
        let units = PositionSizer.size(11_000.0, &risk(1.0, 20.0), &s).unwrap();
        assert_eq!(units, 5000.0);
    }

    #[test]
    fn test_minimum_volume_unaffordable() {
        // balance 10000, 1% = 100 budget; raw = 100/20 = 5 units; quantized 0;
        // min 1000 would risk 20000
        let err = PositionSizer
            .size(10_000.0, &risk(1.0, 20.0), &spec(1000.0, 100_000.0, 1000.0))
            .unwrap_err();
        assert_eq!(
            err,
            SizingError::Unaffordable {
                required: 20_000.0,
                budget: 100.0
            }
        );
    }

    #[test]
    fn test_minimum_volume_affordable() {
        // Flooring lands below a non-step-aligned minimum; the minimum itself
        // still fits the budget (1500 units risk 30 against a 39.98 budget)
        let s = SymbolSpec {
            pip_value: 0.001,
            ..spec(1500.0, 100_000.0, 1000.0)
        };
        let units = PositionSizer.size(3998.0, &risk(1.0, 20.0), &s).unwrap();
        assert_eq!(units, 1500.0);
    }

    #[test]
    fn test_max_volume_clamp() {
        let s = SymbolSpec {
            pip_value: 0.001,
            ..spec(1000.0, 2000.0, 1000.0)
        };
        let units = PositionSizer.size(1_000_000.0, &risk(10.0, 20.0), &s).unwrap();
        assert_eq!(units, 2000.0);
    }

    #[test]
    fn test_invalid_risk_percent() {
        let err = PositionSizer
            .size(10_000.0, &risk(0.0, 20.0), &spec(1000.0, 100_000.0, 1000.0))
            .unwrap_err();
        assert!(matches!(err, SizingError::InvalidRisk { .. }));

        let err = PositionSizer
            .size(10_000.0, &risk(150.0, 20.0), &spec(1000.0, 100_000.0, 1000.0))
            .unwrap_err();
        assert!(matches!(err, SizingError::InvalidRisk { .. }));
    }

    #[test]
    fn test_invalid_stop_distance() {
        let err = PositionSizer
            .size(10_000.0, &risk(1.0, 0.0), &spec(1000.0, 100_000.0, 1000.0))
            .unwrap_err();
        assert!(matches!(err, SizingError::InvalidRisk { .. }));
    }

    #[test]
    fn test_invalid_volume_step() {
        let err = PositionSizer
            .size(10_000.0, &risk(1.0, 20.0), &spec(1000.0, 100_000.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, SizingError::InvalidConfig { .. }));
    }

    #[test]
    fn test_quantize_is_decimal_exact() {
        use rust_decimal_macros::dec;

        assert_eq!(Decimal::from_f64(quantize_down(5500.0, 1000.0)), Some(dec!(5000)));
        // 0.3 / 0.1 is 2.999... in f64; Decimal flooring keeps the full step
        assert_eq!(Decimal::from_f64(quantize_down(0.3, 0.1)), Some(dec!(0.3)));
    }

    #[test]
    fn test_output_within_broker_bounds() {
        let s = SymbolSpec {
            pip_value: 0.001,
            ..spec(1000.0, 50_000.0, 1000.0)
        };
        for balance in [5_000.0, 50_000.0, 500_000.0, 5_000_000.0] {
            if let Ok(units) = PositionSizer.size(balance, &risk(2.0, 30.0), &s) {
                assert!(units >= s.volume_min && units <= s.volume_max);
                assert_eq!(units % s.volume_step, 0.0);
            }
        }
    }
}
