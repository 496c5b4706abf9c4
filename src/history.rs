//! Bounded bar history
//!
//! Fixed-capacity, insertion-ordered storage for closed bars. All downstream
//! components read the ordered slice this buffer exposes.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Bar;

/// Errors from history ingestion
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("bar timestamp {incoming} is older than last stored bar {last}")]
    OutOfOrder {
        incoming: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// Outcome of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// Bar stored (oldest evicted if at capacity)
    Pushed,
    /// Same timestamp as the last stored bar; ingestion is idempotent
    Duplicate,
}

/// Fixed-capacity ordered sequence of price bars
///
/// Invariant: timestamps are strictly increasing. A bar with the same
/// timestamp as the last stored bar is duplicate ingestion and coalesces to a
/// no-op; an older timestamp is rejected.
#[derive(Debug, Clone)]
pub struct BoundedBarHistory {
    bars: Vec<Bar>,
    capacity: usize,
}

impl BoundedBarHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            bars: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Append a closed bar, evicting the oldest when over capacity
    pub fn append(&mut self, bar: Bar) -> Result<Appended, HistoryError> {
        if let Some(last) = self.bars.last() {
            if bar.timestamp == last.timestamp {
                return Ok(Appended::Duplicate);
            }
            if bar.timestamp < last.timestamp {
                return Err(HistoryError::OutOfOrder {
                    incoming: bar.timestamp,
                    last: last.timestamp,
                });
            }
        }

        self.bars.push(bar);
        if self.bars.len() > self.capacity {
            self.bars.remove(0);
        }
        Ok(Appended::Pushed)
    }

    /// Ordered view, oldest first
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
