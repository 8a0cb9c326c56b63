//! Exponential moving average with re-seeding after gaps.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the first `period` consecutive defined inputs.
//! An undefined input (NaN/inf) yields NaN at that position and breaks the recurrence;
//! the EMA re-seeds once `period` consecutive defined inputs are available again.
//! Lookback on a fully defined input: period - 1.
//!
//! This intentionally differs from the pandas-ta `sma=True` convention, which seeds at
//! index period - 1 with the NaN-skipping mean of the first window. Chained over the
//! WaveTrend stages that puts the first wt1/wt2 at 27/29 instead of 11/13, and early
//! values differ slightly until the recurrences converge.

/// Compute EMA values over an arbitrary series.
///
/// Used by the WaveTrend engine, which smooths derived series (hlc3, deviation, ci).
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;
    // Consecutive defined inputs ending at the current position.
    let mut run = 0usize;

    for i in 0..n {
        let v = values[i];
        if !v.is_finite() {
            prev = None;
            run = 0;
            continue;
        }
        run += 1;

        match prev {
            Some(p) => {
                let ema = alpha * v + (1.0 - alpha) * p;
                result[i] = ema;
                prev = Some(ema);
            }
            None if run >= period => {
                let seed = values[(i + 1 - period)..=i].iter().sum::<f64>() / period as f64;
                result[i] = seed;
                prev = Some(seed);
            }
            None => {}
        }
    }

    result
}
