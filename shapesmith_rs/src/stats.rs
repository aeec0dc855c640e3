use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

/// Forward close-to-close return for one horizon, in percent.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ForwardReturn {
    pub horizon: usize,
    pub return_pct: f64,
}

/// Cross-match distribution of forward returns at one horizon.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct HorizonSummary {
    pub horizon: usize,
    pub count: usize,
    pub mean_pct: f64,
    pub median_pct: f64,
    pub min_pct: f64,
    pub max_pct: f64,
}

/// Percentage change from the last bar of a window (`end` exclusive) to each
/// requested horizon. A horizon whose target bar runs past the end of
/// history is omitted rather than defaulted.
pub fn forward_returns(close: &[f64], end: usize, horizons: &[usize]) -> Vec<ForwardReturn> {
    debug_assert!(end > 0 && end <= close.len());
    let anchor_index = end - 1;
    let anchor = close[anchor_index];

    horizons
        .iter()
        .filter_map(|&horizon| {
            let target_index = anchor_index.checked_add(horizon)?;
            let target = *close.get(target_index)?;
            if !anchor.is_finite() || !target.is_finite() || anchor.abs() < f64::EPSILON {
                return None;
            }
            Some(ForwardReturn {
                horizon,
                return_pct: (target / anchor - 1.0) * 100.0,
            })
        })
        .collect()
}

/// Summarize forward returns across matches, per horizon. Horizons with no
/// observation (every match too close to the end of history) are dropped.
pub fn summarize_horizons(
    per_match: &[Vec<ForwardReturn>],
    horizons: &[usize],
) -> Vec<HorizonSummary> {
    horizons
        .iter()
        .filter_map(|&horizon| {
            let observations: Vec<f64> = per_match
                .iter()
                .flat_map(|returns| returns.iter())
                .filter(|r| r.horizon == horizon)
                .map(|r| r.return_pct)
                .collect();
            if observations.is_empty() {
                return None;
            }
            let count = observations.len();
            let mean = observations.iter().sum::<f64>() / count as f64;
            let (min, max) = match observations
                .iter()
                .copied()
                .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            {
                MinMaxResult::NoElements => return None,
                MinMaxResult::OneElement(v) => (v, v),
                MinMaxResult::MinMax(min, max) => (min, max),
            };
            Some(HorizonSummary {
                horizon,
                count,
                mean_pct: mean,
                median_pct: median(&observations),
                min_pct: min,
                max_pct: max,
            })
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
