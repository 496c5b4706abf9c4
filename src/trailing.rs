//! Trailing stop management
//!
//! Recomputes protective stops for open positions and ratchets them
//! monotonically in the position's favor. A stop never moves backward and
//! never lands behind the entry price until it has first cleared entry.

use tracing::debug;

use crate::{round_price, OpenPosition, Side, SymbolSpec, TrailingStopIntent};

/// Monotonic trailing-stop recomputation
#[derive(Debug, Clone)]
pub struct TrailingStopManager {
    trailing_distance_pips: f64,
}

impl TrailingStopManager {
    pub fn new(trailing_distance_pips: f64) -> Self {
        Self {
            trailing_distance_pips,
        }
    }

    /// Trailing is disabled at a non-positive distance
    pub fn is_active(&self) -> bool {
        self.trailing_distance_pips > 0.0
    }

    /// One pass over the open positions; at most one intent per position
    ///
    /// Positions that fail the monotonic-improvement condition are left
    /// untouched, so a second pass at unchanged prices yields nothing.
    pub fn evaluate(
        &self,
        positions: &[OpenPosition],
        bid: f64,
        ask: f64,
        spec: &SymbolSpec,
        label: &str,
    ) -> Vec<TrailingStopIntent> {
        if !self.is_active() {
            return Vec::new();
        }

        let distance = self.trailing_distance_pips * spec.pip_size;
        let mut intents = Vec::new();

        for position in positions
            .iter()
            .filter(|p| p.label == label && p.symbol == spec.symbol)
        {
            let candidate = match position.side {
                Side::Buy => round_price(bid - distance, spec.digits),
                Side::Sell => round_price(ask + distance, spec.digits),
            };

            let improves = match position.side {
                Side::Buy => {
                    candidate > position.entry_price
                        && position.stop_loss.map_or(true, |stop| candidate > stop)
                }
                Side::Sell => {
                    candidate < position.entry_price
                        && position.stop_loss.map_or(true, |stop| candidate < stop)
                }
            };

            if improves {
                debug!(
                    position = position.id,
                    side = %position.side,
                    candidate,
                    current = ?position.stop_loss,
                    "trailing stop advanced"
                );
                intents.push(TrailingStopIntent {
                    position_id: position.id,
                    new_stop_loss: candidate,
                });
            }
        }

        intents
    }
}
