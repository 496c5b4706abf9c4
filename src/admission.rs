//! Trade admission gating
//!
//! Cheap precondition checks ahead of the sizing/entry path: trading-session
//! window, one-trade-per-calendar-day limit, and no duplicate open position
//! for this engine's label and symbol.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{OpenPosition, Symbol};

/// Session gating parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session open, server time of day (default: 08:00:00)
    #[serde(default = "default_session_start")]
    pub session_start: NaiveTime,

    /// Session close, exclusive (default: 17:00:00)
    #[serde(default = "default_session_end")]
    pub session_end: NaiveTime,

    /// Allow at most one trade per calendar day (default: true)
    #[serde(default = "default_one_trade_per_day")]
    pub one_trade_per_day: bool,
}

fn default_session_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap()
}
fn default_session_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap()
}
fn default_one_trade_per_day() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_start: default_session_start(),
            session_end: default_session_end(),
            one_trade_per_day: default_one_trade_per_day(),
        }
    }
}

/// Reason a trade was not admitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionBlock {
    #[error("server time {0} is outside the trading session")]
    OutsideSession(NaiveTime),

    #[error("already traded on {0}")]
    AlreadyTradedToday(NaiveDate),

    #[error("position {0} with this label is already open")]
    PositionOpen(u64),
}

/// Entry precondition checks
#[derive(Debug, Clone)]
pub struct TradeAdmissionGate {
    config: SessionConfig,
}

impl TradeAdmissionGate {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run all precondition checks; the first failing check blocks
    pub fn admit(
        &self,
        now: DateTime<Utc>,
        last_trade_date: Option<NaiveDate>,
        positions: &[OpenPosition],
        label: &str,
        symbol: &Symbol,
    ) -> Result<(), AdmissionBlock> {
        let time = now.time();
        if !self.in_session(time) {
            return Err(AdmissionBlock::OutsideSession(time));
        }

        if self.config.one_trade_per_day {
            let today = now.date_naive();
            if last_trade_date == Some(today) {
                return Err(AdmissionBlock::AlreadyTradedToday(today));
            }
        }

        if let Some(open) = positions
            .iter()
            .find(|p| p.label == label && &p.symbol == symbol)
        {
            return Err(AdmissionBlock::PositionOpen(open.id));
        }

        Ok(())
    }

    /// Half-open window [start, end); an end at or before start wraps
    /// overnight
    fn in_session(&self, time: NaiveTime) -> bool {
        let (start, end) = (self.config.session_start, self.config.session_end);
        if start < end {
            time >= start && time < end
        } else {
            time >= start || time < end
        }
    }
}
