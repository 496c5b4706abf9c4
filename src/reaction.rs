//! Breakout-then-reaction entry timing
//!
//! Delays a trend-following entry until a counter-trend fractal level on the
//! higher timeframe is broken and price reacts back in the trend direction.
//! Implemented as an explicit finite-state machine: the phase enum plus one
//! transition step per evaluation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fractal::{find_down_fractal, find_up_fractal};
use crate::{Bar, MarketContext, Side};

/// Reaction cycle parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReactionConfig {
    /// Bars on each side required to confirm a fractal (default: 2)
    #[serde(default = "default_fractal_window")]
    pub fractal_window: usize,

    /// Reaction distance from the breakout close, in percent (default: 0.1)
    #[serde(default = "default_reaction_pct")]
    pub reaction_pct: f64,

    /// Abandon an unconfirmed breakout after this long (default: 240)
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: i64,
}

fn default_fractal_window() -> usize {
    2
}
fn default_reaction_pct() -> f64 {
    0.1
}
fn default_timeout_minutes() -> i64 {
    240
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            fractal_window: default_fractal_window(),
            reaction_pct: default_reaction_pct(),
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

/// State machine phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReactionPhase {
    /// No level tracked
    Idle,
    /// A counter-trend fractal level identified, not yet broken
    LevelTracked { direction: Side, level: f64 },
    /// Level broken; waiting for price to react back in the trend direction
    AwaitingReaction {
        direction: Side,
        breakout_close: f64,
        target: f64,
        negation: f64,
        started: DateTime<Utc>,
    },
}

impl ReactionPhase {
    fn direction(&self) -> Option<Side> {
        match self {
            ReactionPhase::Idle => None,
            ReactionPhase::LevelTracked { direction, .. } => Some(*direction),
            ReactionPhase::AwaitingReaction { direction, .. } => Some(*direction),
        }
    }
}

/// Breakout/reaction tracker, one per engine session
#[derive(Debug, Clone)]
pub struct ReactionTracker {
    config: ReactionConfig,
    phase: ReactionPhase,
}

impl ReactionTracker {
    pub fn new(config: ReactionConfig) -> Self {
        Self {
            config,
            phase: ReactionPhase::Idle,
        }
    }

    pub fn phase(&self) -> &ReactionPhase {
        &self.phase
    }

    pub fn reset(&mut self) {
        self.phase = ReactionPhase::Idle;
    }

    /// Advance the machine by one closed bar
    ///
    /// Returns the entry side only on a confirmed reaction; every other
    /// outcome is a silent phase change.
    pub fn step(
        &mut self,
        context: MarketContext,
        higher_bars: &[Bar],
        current: &Bar,
        now: DateTime<Utc>,
    ) -> Option<Side> {
        // A context change away from the active direction abandons the cycle
        if let Some(active) = self.phase.direction() {
            if context.trend_side() != Some(active) {
                debug!(?active, %context, "context left active direction, resetting reaction cycle");
                self.phase = ReactionPhase::Idle;
            }
        }

        match self.phase {
            ReactionPhase::Idle => {
                let Some(direction) = context.trend_side() else {
                    return None;
                };
                let level = match direction {
                    Side::Buy => find_down_fractal(higher_bars, self.config.fractal_window),
                    Side::Sell => find_up_fractal(higher_bars, self.config.fractal_window),
                };
                if let Some(level) = level {
                    debug!(%direction, level = level.price, "tracking counter-trend fractal level");
                    self.phase = ReactionPhase::LevelTracked {
                        direction,
                        level: level.price,
                    };
                }
                None
            }

            ReactionPhase::LevelTracked { direction, level } => {
                let broken = match direction {
                    Side::Buy => current.low < level,
                    Side::Sell => current.high > level,
                };
                if broken {
                    let pct = self.config.reaction_pct / 100.0;
                    let (target, negation) = match direction {
                        Side::Buy => (current.close * (1.0 + pct), current.close * (1.0 - pct)),
                        Side::Sell => (current.close * (1.0 - pct), current.close * (1.0 + pct)),
                    };
                    debug!(
                        %direction,
                        breakout_close = current.close,
                        target,
                        "fractal level broken, awaiting reaction"
                    );
                    self.phase = ReactionPhase::AwaitingReaction {
                        direction,
                        breakout_close: current.close,
                        target,
                        negation,
                        started: now,
                    };
                }
                None
            }

            ReactionPhase::AwaitingReaction {
                direction,
                target,
                negation,
                started,
                ..
            } => {
                if now - started > Duration::minutes(self.config.timeout_minutes) {
                    debug!(%direction, "reaction wait timed out");
                    self.phase = ReactionPhase::Idle;
                    return None;
                }

                let confirmed = match direction {
                    Side::Buy => current.close > target,
                    Side::Sell => current.close < target,
                };
                if confirmed {
                    debug!(%direction, close = current.close, target, "reaction confirmed");
                    self.phase = ReactionPhase::Idle;
                    return Some(direction);
                }

                let negated = match direction {
                    Side::Buy => current.low < negation,
                    Side::Sell => current.high > negation,
                };
                if negated {
                    debug!(%direction, "breakout continued against the expected reaction");
                    self.phase = ReactionPhase::Idle;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn bar(minute: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new_unchecked(t(minute), close, high, low, close, 100.0)
    }

    /// Higher-timeframe bars with a down-fractal low at 1.0950 (index 3)
    fn higher_with_down_fractal() -> Vec<Bar> {
        [1.1000, 1.0990, 1.0980, 1.0950, 1.0990, 1.1010, 1.1020]
            .iter()
            .enumerate()
            .map(|(i, &low)| bar(i as i64 * 60, low + 0.004, low, low + 0.002))
            .collect()
    }

    fn config() -> ReactionConfig {
        ReactionConfig {
            fractal_window: 2,
            reaction_pct: 0.1,
            timeout_minutes: 120,
        }
    }

    #[test]
    fn test_full_buy_cycle() {
        let mut tracker = ReactionTracker::new(config());
        let higher = higher_with_down_fractal();
        let up = MarketContext::TrendingUp;

        // Idle -> LevelTracked on the down-fractal at 1.0950
        assert_eq!(tracker.step(up, &higher, &bar(0, 1.1010, 1.0990, 1.1000), t(0)), None);
        assert!(matches!(
            tracker.phase(),
            ReactionPhase::LevelTracked { direction: Side::Buy, level } if *level == 1.0950
        ));

        // Low pierces the level: breakout captured at close 1.0960
        assert_eq!(tracker.step(up, &higher, &bar(1, 1.0990, 1.0940, 1.0960), t(1)), None);
        let target = match tracker.phase() {
            ReactionPhase::AwaitingReaction { target, .. } => *target,
            other => panic!("expected AwaitingReaction, got {:?}", other),
        };
        assert!((target - 1.0960 * 1.001).abs() < 1e-9);

        // Close above the target confirms the entry
        let signal = tracker.step(up, &higher, &bar(2, 1.0990, 1.0955, 1.0975), t(2));
        assert_eq!(signal, Some(Side::Buy));
        assert_eq!(*tracker.phase(), ReactionPhase::Idle);
    }

    #[test]
    fn test_timeout_resets_without_signal() {
        let mut tracker = ReactionTracker::new(config());
        let higher = higher_with_down_fractal();
        let up = MarketContext::TrendingUp;

        tracker.step(up, &higher, &bar(0, 1.1010, 1.0990, 1.1000), t(0));
        tracker.step(up, &higher, &bar(1, 1.0990, 1.0940, 1.0960), t(1));
        assert!(matches!(tracker.phase(), ReactionPhase::AwaitingReaction { .. }));

        // Neither confirming nor negating, but past the timeout
        let signal = tracker.step(up, &higher, &bar(200, 1.0965, 1.0958, 1.0961), t(200));
        assert_eq!(signal, None);
        assert_eq!(*tracker.phase(), ReactionPhase::Idle);
    }

    #[test]
    fn test_negation_abandons_cycle() {
        let mut tracker = ReactionTracker::new(config());
        let higher = higher_with_down_fractal();
        let up = MarketContext::TrendingUp;

        tracker.step(up, &higher, &bar(0, 1.1010, 1.0990, 1.1000), t(0));
        tracker.step(up, &higher, &bar(1, 1.0990, 1.0940, 1.0960), t(1));

        // Continuation below breakout_close * (1 - pct): abandoned
        let signal = tracker.step(up, &higher, &bar(2, 1.0955, 1.0900, 1.0910), t(2));
        assert_eq!(signal, None);
        assert_eq!(*tracker.phase(), ReactionPhase::Idle);
    }

    #[test]
    fn test_context_change_resets() {
        let mut tracker = ReactionTracker::new(config());
        let higher = higher_with_down_fractal();

        tracker.step(MarketContext::TrendingUp, &higher, &bar(0, 1.1010, 1.0990, 1.1000), t(0));
        assert!(matches!(tracker.phase(), ReactionPhase::LevelTracked { .. }));

        // Ranging kills the tracked level; no higher-TF fractal lookup for Ranging
        tracker.step(MarketContext::Ranging, &higher, &bar(1, 1.1010, 1.0990, 1.1000), t(1));
        assert_eq!(*tracker.phase(), ReactionPhase::Idle);
    }

    #[test]
    fn test_sell_cycle_symmetric() {
        let mut tracker = ReactionTracker::new(config());
        // Up-fractal high at 1.1050 (index 3)
        let higher: Vec<Bar> = [1.1000, 1.1010, 1.1020, 1.1050, 1.1010, 1.0990, 1.0980]
            .iter()
            .enumerate()
            .map(|(i, &high)| bar(i as i64 * 60, high, high - 0.004, high - 0.002))
            .collect();
        let down = MarketContext::TrendingDown;

        tracker.step(down, &higher, &bar(0, 1.1000, 1.0980, 1.0990), t(0));
        assert!(matches!(
            tracker.phase(),
            ReactionPhase::LevelTracked { direction: Side::Sell, level } if *level == 1.1050
        ));

        // High pierces the level: breakout at close 1.1040
        tracker.step(down, &higher, &bar(1, 1.1060, 1.1020, 1.1040), t(1));
        assert!(matches!(tracker.phase(), ReactionPhase::AwaitingReaction { direction: Side::Sell, .. }));

        // Close below target (1.1040 * 0.999 = 1.102896) confirms the short
        let signal = tracker.step(down, &higher, &bar(2, 1.1035, 1.1010, 1.1020), t(2));
        assert_eq!(signal, Some(Side::Sell));
    }

    #[test]
    fn test_opposite_trend_resets_then_retracks() {
        let mut tracker = ReactionTracker::new(config());
        // Series with both a down-fractal (low 1.0950, index 2) and an
        // up-fractal (high 1.1040, index 4)
        let higher: Vec<Bar> = [1.1000, 1.0990, 1.0950, 1.0990, 1.1000, 1.0990, 1.0980]
            .iter()
            .enumerate()
            .map(|(i, &low)| bar(i as i64 * 60, low + 0.004, low, low + 0.002))
            .collect();

        tracker.step(MarketContext::TrendingUp, &higher, &bar(0, 1.1010, 1.0990, 1.1000), t(0));
        assert!(matches!(
            tracker.phase(),
            ReactionPhase::LevelTracked { direction: Side::Buy, level } if *level == 1.0950
        ));

        // Flip to a downtrend: the buy-side level dies and the sell-side
        // up-fractal is tracked in the same step
        tracker.step(MarketContext::TrendingDown, &higher, &bar(1, 1.1010, 1.0990, 1.1000), t(1));
        assert!(matches!(
            tracker.phase(),
            ReactionPhase::LevelTracked { direction: Side::Sell, level } if *level == 1.1040
        ));
    }
}
