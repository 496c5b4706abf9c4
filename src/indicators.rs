//! Technical indicator primitives
//!
//! Free functions over price slices. All series-returning functions yield
//! `None` for warm-up positions where the indicator is not yet defined.

/// Exponential Moving Average, seeded with the SMA of the first `period` values
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());

    if values.is_empty() || period == 0 {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema_value: Option<f64> = None;

    for (i, &value) in values.iter().enumerate() {
        if i + 1 < period {
            result.push(None);
        } else if i + 1 == period {
            let sum: f64 = values[0..period].iter().sum();
            ema_value = Some(sum / period as f64);
            result.push(ema_value);
        } else if let Some(prev) = ema_value {
            let next = (value - prev) * multiplier + prev;
            ema_value = Some(next);
            result.push(Some(next));
        }
    }

    result
}

/// True Range series; the first element falls back to high - low
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(high.len());

    for i in 0..high.len() {
        let value = if i == 0 {
            high[i] - low[i]
        } else {
            let hl = high[i] - low[i];
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        };
        tr.push(value);
    }

    tr
}

/// Average True Range with Wilder smoothing
///
/// Seeded by the simple average of the first `period` true-range values, then
/// `atr[i] = (atr[i-1] * (period - 1) + tr[i]) / period`.
pub fn wilder_atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    let tr = true_range(high, low, close);
    let mut result = Vec::with_capacity(tr.len());

    if period == 0 {
        return result;
    }

    let mut atr_value: Option<f64> = None;

    for (i, &tr_value) in tr.iter().enumerate() {
        if i + 1 < period {
            result.push(None);
        } else if i + 1 == period {
            let seed: f64 = tr[0..period].iter().sum::<f64>() / period as f64;
            atr_value = Some(seed);
            result.push(atr_value);
        } else if let Some(prev) = atr_value {
            let next = (prev * (period as f64 - 1.0) + tr_value) / period as f64;
            atr_value = Some(next);
            result.push(Some(next));
        }
    }

    result
}

/// Relative Strength Index
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());

    gains.push(0.0);
    losses.push(0.0);

    for i in 1..values.len() {
        let change = values[i] - values[i - 1];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let avg_gains = ema(&gains, period);
    let avg_losses = ema(&losses, period);

    let mut result = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if let (Some(avg_gain), Some(avg_loss)) = (avg_gains[i], avg_losses[i]) {
            if avg_loss == 0.0 {
                result.push(Some(100.0));
            } else {
                let rs = avg_gain / avg_loss;
                result.push(Some(100.0 - (100.0 / (1.0 + rs))));
            }
        } else {
            result.push(None);
        }
    }

    result
}

/// MACD line and its signal line
///
/// Line = EMA(fast) - EMA(slow); signal = EMA(line, signal_period) computed
/// over the defined portion of the line.
pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let ema_fast = ema(values, fast);
    let ema_slow = ema(values, slow);

    let mut line = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        match (ema_fast.get(i).copied().flatten(), ema_slow.get(i).copied().flatten()) {
            (Some(f), Some(s)) => line.push(Some(f - s)),
            _ => line.push(None),
        }
    }

    // The line is defined from the first Some onward; run the signal EMA over
    // that compact region and shift it back into place.
    let offset = line.iter().position(|v| v.is_some()).unwrap_or(line.len());
    let compact: Vec<f64> = line[offset..].iter().filter_map(|&v| v).collect();
    let compact_signal = ema(&compact, signal);

    let mut signal_line = vec![None; offset];
    signal_line.extend(compact_signal);
    signal_line.resize(values.len(), None);

    (line, signal_line)
}

/// Directional Movement components (+DI and -DI, EMA-smoothed)
pub fn dmi(high: &[f64], low: &[f64], period: usize) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut plus_dm = vec![0.0; high.len()];
    let mut minus_dm = vec![0.0; high.len()];

    for i in 1..high.len() {
        let up_move = high[i] - high[i - 1];
        let down_move = low[i - 1] - low[i];

        if up_move > down_move && up_move > 0.0 {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            minus_dm[i] = down_move;
        }
    }

    (ema(&plus_dm, period), ema(&minus_dm, period))
}

/// Average Directional Index
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    let (plus_di, minus_di) = dmi(high, low, period);
    let atr_values = wilder_atr(high, low, close, period);

    let mut dx = Vec::with_capacity(high.len());

    for i in 0..high.len() {
        if let (Some(pdi), Some(mdi), Some(atr_val)) = (plus_di[i], minus_di[i], atr_values[i]) {
            if atr_val > 0.0 {
                let pdi_norm = pdi / atr_val * 100.0;
                let mdi_norm = mdi / atr_val * 100.0;

                let sum = pdi_norm + mdi_norm;
                if sum > 0.0 {
                    dx.push(((pdi_norm - mdi_norm).abs() / sum) * 100.0);
                } else {
                    dx.push(0.0);
                }
            } else {
                dx.push(0.0);
            }
        } else {
            dx.push(0.0);
        }
    }

    ema(&dx, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ema_warmup_and_seed() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(2.0));
        // (4 - 2) * 0.5 + 2 = 3
        assert_relative_eq!(result[3].unwrap(), 3.0);
    }

    #[test]
    fn test_true_range_gap() {
        let high = vec![1.10, 1.20];
        let low = vec![1.05, 1.18];
        let close = vec![1.08, 1.19];
        let tr = true_range(&high, &low, &close);

        assert_relative_eq!(tr[0], 0.05, epsilon = 1e-12);
        // Gap up: high - prev_close = 0.12 dominates high - low = 0.02
        assert_relative_eq!(tr[1], 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_wilder_atr_constant_range() {
        // Constant 1.0 true range: seed = 1.0 and the recurrence holds there
        let high: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 1.0).collect();
        let close: Vec<f64> = high.iter().map(|h| h - 0.5).collect();

        let atr = wilder_atr(&high, &low, &close, 3);
        assert_eq!(atr[0], None);
        assert_eq!(atr[1], None);
        assert!(atr[2].is_some());
        // TR from bar 1 on is max(1.0, |high - prev_close| = 1.5) = 1.5
        let last = atr.last().unwrap().unwrap();
        assert_relative_eq!(last, 1.5, epsilon = 0.2);
    }

    #[test]
    fn test_rsi_all_gains() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&values, 14);
        assert_eq!(result.last().copied().flatten(), Some(100.0));
    }

    #[test]
    fn test_macd_alignment() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let (line, signal) = macd(&values, 12, 26, 9);

        assert_eq!(line.len(), values.len());
        assert_eq!(signal.len(), values.len());
        assert_eq!(line[24], None);
        assert!(line[25].is_some());
        // Signal needs `signal` defined line values after the line starts
        assert_eq!(signal[32], None);
        assert!(signal[33].is_some());
    }

    #[test]
    fn test_adx_trending_vs_flat() {
        let n = 60;
        let trend_high: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let trend_low: Vec<f64> = trend_high.iter().map(|h| h - 0.5).collect();
        let trend_close: Vec<f64> = trend_high.iter().map(|h| h - 0.2).collect();

        let flat_high: Vec<f64> = (0..n).map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { 0.0 }).collect();
        let flat_low: Vec<f64> = flat_high.iter().map(|h| h - 0.5).collect();
        let flat_close: Vec<f64> = flat_high.iter().map(|h| h - 0.25).collect();

        let trending = adx(&trend_high, &trend_low, &trend_close, 14);
        let flat = adx(&flat_high, &flat_low, &flat_close, 14);

        let t = trending.last().unwrap().unwrap();
        let f = flat.last().unwrap().unwrap();
        assert!(t > f, "trending adx {} should exceed flat adx {}", t, f);
    }
}
