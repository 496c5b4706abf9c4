//! Fractal detection
//!
//! A fractal is a bar whose high (or low) is a strict local extremum over a
//! symmetric window of bars on each side. Detection scans backward so the
//! most recent confirmed extremum wins.

use chrono::{DateTime, Utc};

use crate::Bar;

/// A confirmed local extremum level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalLevel {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Most recent up-fractal: a high strictly above the highs of `window` bars
/// on each side
pub fn find_up_fractal(bars: &[Bar], window: usize) -> Option<FractalLevel> {
    find_fractal(bars, window, |b| b.high, |center, other| center > other)
}

/// Most recent down-fractal: a low strictly below the lows of `window` bars
/// on each side
pub fn find_down_fractal(bars: &[Bar], window: usize) -> Option<FractalLevel> {
    find_fractal(bars, window, |b| b.low, |center, other| center < other)
}

fn find_fractal(
    bars: &[Bar],
    window: usize,
    price: impl Fn(&Bar) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Option<FractalLevel> {
    if window == 0 || bars.len() < 2 * window + 1 {
        return None;
    }

    // Latest index with `window` bars of confirmation on its right
    let newest = bars.len() - 1 - window;

    for i in (window..=newest).rev() {
        let center = price(&bars[i]);
        let is_extremum = bars[i - window..i]
            .iter()
            .chain(&bars[i + 1..=i + window])
            .all(|b| beats(center, price(b)));

        if is_extremum {
            return Some(FractalLevel {
                price: center,
                timestamp: bars[i].timestamp,
            });
        }
    }

    None
}
