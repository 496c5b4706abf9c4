//! Data loading for the replay driver
//!
//! Loads OHLCV bars from CSV files with a `timestamp,open,high,low,close,volume`
//! layout and checks the series is usable before it is replayed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

use crate::Bar;

/// Load bars from a CSV file
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path.as_ref()).context("Failed to open CSV file")?;

    let mut bars = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let ts_str = record.get(0).context("Missing timestamp column")?;
        let timestamp = ts_str
            .parse::<DateTime<Utc>>()
            .or_else(|_| {
                // Accept naive timestamps and assume UTC
                chrono::NaiveDateTime::parse_from_str(ts_str, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
            })
            .context(format!("Failed to parse timestamp: {}", ts_str))?;

        let open: f64 = record
            .get(1)
            .context("Missing open column")?
            .parse()
            .context("Failed to parse open")?;
        let high: f64 = record
            .get(2)
            .context("Missing high column")?
            .parse()
            .context("Failed to parse high")?;
        let low: f64 = record
            .get(3)
            .context("Missing low column")?
            .parse()
            .context("Failed to parse low")?;
        let close: f64 = record
            .get(4)
            .context("Missing close column")?
            .parse()
            .context("Failed to parse close")?;
        let volume: f64 = record
            .get(5)
            .context("Missing volume column")?
            .parse()
            .context("Failed to parse volume")?;

        bars.push(Bar::new_unchecked(timestamp, open, high, low, close, volume));
    }

    info!("Loaded {} bars from {}", bars.len(), path.as_ref().display());
    Ok(bars)
}

/// Result of series validation
#[derive(Debug)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a loaded bar series for replay
pub fn validate_bars(bars: &[Bar]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if bars.is_empty() {
        errors.push("No bars provided".to_string());
        return ValidationResult { errors, warnings };
    }

    for (i, bar) in bars.iter().enumerate() {
        if let Err(err) = bar.validate() {
            errors.push(format!("Bar {}: {}", i, err));
        }
        if i > 0 && bar.timestamp < bars[i - 1].timestamp {
            errors.push(format!("Bar {}: not chronological", i));
        }
        if i > 0 && bar.timestamp == bars[i - 1].timestamp {
            warnings.push(format!("Bar {}: duplicate timestamp", i));
        }
    }

    ValidationResult { errors, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar_at(minute: i64, close: f64) -> Bar {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        Bar::new_unchecked(t, close, close + 0.001, close - 0.001, close, 100.0)
    }

    #[test]
    fn test_validate_clean_series() {
        let bars = vec![bar_at(0, 1.1), bar_at(1, 1.2), bar_at(2, 1.3)];
        let result = validate_bars(&bars);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_flags_regression() {
        let bars = vec![bar_at(5, 1.1), bar_at(3, 1.2)];
        let result = validate_bars(&bars);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_warns_duplicates() {
        let bars = vec![bar_at(0, 1.1), bar_at(0, 1.1)];
        let result = validate_bars(&bars);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_empty() {
        assert!(!validate_bars(&[]).is_valid());
    }

    #[test]
    fn test_load_csv_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join("fx_strategies_test_bars.csv");
        std::fs::write(
            &path,
            "timestamp,open,high,low,close,volume\n\
             2024-03-01 10:00:00,1.1000,1.1010,1.0990,1.1005,1500\n\
             2024-03-01 10:01:00,1.1005,1.1020,1.1000,1.1015,1600\n",
        )
        .unwrap();

        let bars = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.1005);
        assert_eq!(bars[1].volume, 1600.0);
    }
}
