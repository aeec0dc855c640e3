//! Rolling indicator kernels behind [`crate::SignalMatrix`].
//!
//! Every function maps a full close series to a full-length output vector.
//! Bars that cannot be computed (warm-up, non-finite inputs, degenerate
//! denominators) come out as NaN so callers can window first and validate
//! later.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Wilder-smoothed RSI on a 0-100 scale.
///
/// The smoothed averages are seeded with the simple mean of the first
/// `period` changes; everything before bar `period` is NaN.
pub fn momentum_rsi(close: &[f64], period: usize) -> Vec<f64> {
    let len = close.len();
    let mut out = vec![f64::NAN; len];
    if period == 0 || len < period + 1 {
        return out;
    }

    let mut gains = vec![f64::NAN; len];
    let mut losses = vec![f64::NAN; len];
    for i in 1..len {
        if close[i].is_finite() && close[i - 1].is_finite() {
            let change = close[i] - close[i - 1];
            gains[i] = change.max(0.0);
            losses[i] = (-change).max(0.0);
        }
    }

    if gains[1..=period].iter().any(|g| !g.is_finite()) {
        return out;
    }
    let mut avg_gain = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[1..=period].iter().sum::<f64>() / period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    for i in period + 1..len {
        if !gains[i].is_finite() {
            continue;
        }
        avg_gain = (avg_gain * (period as f64 - 1.0) + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + losses[i]) / period as f64;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Least-squares slope of close over a rolling `period`, expressed as a
/// percentage of the bar's close so the signal is comparable across symbols.
pub fn trend_slope_pct(close: &[f64], period: usize) -> Vec<f64> {
    let len = close.len();
    let mut out = vec![f64::NAN; len];
    if period < 2 || len < period {
        return out;
    }

    // x is the fixed 0..period ramp, so its mean and squared deviation sum
    // can be hoisted out of the per-bar loop.
    let n = period as f64;
    let x_mean = (n - 1.0) / 2.0;
    let x_var_sum = (0..period)
        .map(|x| {
            let d = x as f64 - x_mean;
            d * d
        })
        .sum::<f64>();

    for i in period - 1..len {
        let window = &close[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let y_mean = window.iter().sum::<f64>() / n;
        let cov_sum = window
            .iter()
            .enumerate()
            .map(|(x, &y)| (x as f64 - x_mean) * (y - y_mean))
            .sum::<f64>();
        let slope = cov_sum / x_var_sum;
        let anchor = close[i];
        if anchor.abs() < f64::EPSILON {
            continue;
        }
        out[i] = slope / anchor * 100.0;
    }
    out
}

/// Annualized rolling standard deviation of 1-bar simple returns, in %.
pub fn rolling_volatility(close: &[f64], period: usize) -> Vec<f64> {
    let len = close.len();
    let mut returns = vec![f64::NAN; len];
    for i in 1..len {
        let prev = close[i - 1];
        if close[i].is_finite() && prev.is_finite() && prev.abs() > f64::EPSILON {
            returns[i] = close[i] / prev - 1.0;
        }
    }

    let std = rolling_std(&returns, period);
    std.into_iter()
        .map(|s| {
            if s.is_finite() {
                s * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// % distance of close below its rolling `period`-bar maximum. Zero at a
/// fresh high, negative below it.
pub fn drawdown_to_high(close: &[f64], period: usize) -> Vec<f64> {
    let len = close.len();
    let mut out = vec![f64::NAN; len];
    if period == 0 || len < period {
        return out;
    }
    for i in period - 1..len {
        let window = &close[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let high = window.iter().copied().fold(f64::MIN, f64::max);
        if high.abs() < f64::EPSILON {
            continue;
        }
        out[i] = (close[i] / high - 1.0) * 100.0;
    }
    out
}

/// Sample standard deviation over a rolling window; NaN until the window is
/// full or when it contains a non-finite value.
fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let len = values.len();
    if period == 0 {
        return vec![f64::NAN; len];
    }
    if period == 1 {
        return vec![0.0; len];
    }
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                return f64::NAN;
            }
            let slice = &values[i + 1 - period..=i];
            if slice.iter().any(|v| !v.is_finite()) {
                return f64::NAN;
            }
            let mean = slice.iter().sum::<f64>() / period as f64;
            let variance_sum = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
            (variance_sum / (period - 1) as f64).sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f64> {
        (0..len).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn rsi_warmup_prefix_is_nan_then_bounded() {
        let close = ramp(40);
        let rsi = momentum_rsi(&close, 14);
        assert!(rsi[..14].iter().all(|v| v.is_nan()));
        for v in rsi[14..].iter() {
            assert!(v.is_finite());
            assert!((0.0..=100.0).contains(v));
        }
        // Monotonically rising closes have no losses.
        assert_eq!(rsi[14], 100.0);
    }

    #[test]
    fn rsi_of_constant_series_plateaus() {
        let close = vec![50.0; 40];
        let rsi = momentum_rsi(&close, 14);
        for v in rsi[14..].iter() {
            assert_eq!(*v, 100.0);
        }
    }

    #[test]
    fn trend_slope_matches_linear_ramp() {
        let close = ramp(30);
        let slope = trend_slope_pct(&close, 20);
        assert!(slope[..19].iter().all(|v| v.is_nan()));
        // Slope of the ramp is exactly 1 per bar; as % of close at bar 19
        // (close = 119) that is 100/119.
        let expected = 1.0 / 119.0 * 100.0;
        assert!((slope[19] - expected).abs() < 1e-9);
    }

    #[test]
    fn flat_series_has_zero_slope_and_volatility() {
        let close = vec![42.0; 80];
        let slope = trend_slope_pct(&close, 20);
        let vol = rolling_volatility(&close, 20);
        assert_eq!(slope[25], 0.0);
        assert_eq!(vol[25], 0.0);
    }

    #[test]
    fn drawdown_is_zero_at_highs_and_negative_below() {
        let mut close = ramp(70);
        close[65] = close[64] * 0.9;
        let dd = drawdown_to_high(&close, 60);
        assert!(dd[..59].iter().all(|v| v.is_nan()));
        assert_eq!(dd[64], 0.0);
        assert!(dd[65] < 0.0);
    }

    #[test]
    fn nan_input_poisons_only_affected_windows() {
        let mut close = ramp(95);
        close[30] = f64::NAN;
        let dd = drawdown_to_high(&close, 60);
        // Windows covering bar 30 are NaN; the first window past it recovers.
        assert!(dd[89].is_nan());
        assert!(dd[90].is_finite());
    }
}
