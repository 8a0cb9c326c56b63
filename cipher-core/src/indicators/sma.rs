//! Simple moving average over derived series.
//!
//! Smooths wt1 into wt2 and the normalized money flow into rsi_mfi.
//! A window containing any undefined value is undefined.

/// Rolling mean of an arbitrary series.
///
/// Each window is summed from scratch so results do not accumulate rounding drift
/// and undefined values leave the window cleanly.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }

    result
}
