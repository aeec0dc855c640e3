use anyhow::{Context, Result, anyhow};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{info, warn};

use signals_rs::{FeatureKind, SignalMatrix, max_warmup};

use crate::config::Config;
use crate::data::PriceSeries;
use crate::distance::{DistanceResult, compare_windows};
use crate::error::ScanError;
use crate::feature::{FeatureWeights, MIN_VALID_POINTS, WindowFeatures};
use crate::progress::ProgressTracker;
use crate::report::{MatchRecord, ScanReport, WindowSpan};
use crate::stats::{forward_returns, summarize_horizons};

/// One full pattern-matching pass: derive signals, place the current window,
/// scan every candidate placement in parallel, rank what survives the
/// threshold, and attach forward outcomes.
pub struct MatchPipeline {
    config: Config,
    series: PriceSeries,
    matrix: SignalMatrix,
    kinds: Vec<FeatureKind>,
    weights: FeatureWeights,
}

impl MatchPipeline {
    pub fn new(config: Config, series: PriceSeries) -> Result<Self> {
        if config.window == 0 {
            return Err(anyhow!("window length must be positive"));
        }

        let kinds = parse_features(&config.features)?;
        let weights = FeatureWeights::resolve(&kinds, &config.weights);
        let matrix = SignalMatrix::from_close(series.close(), &kinds);

        Ok(Self {
            config,
            series,
            matrix,
            kinds,
            weights,
        })
    }

    pub fn run(&self) -> Result<ScanReport> {
        let window = self.config.window;
        let len = self.series.len();
        let warmup = max_warmup(&self.kinds);
        let required = 2 * window + warmup;
        if len < required {
            return Err(ScanError::InsufficientHistory {
                required,
                window,
                warmup,
                actual: len,
            }
            .into());
        }

        let current_start = len - window;
        let current = WindowFeatures::extract(&self.matrix, &self.kinds, current_start, len);
        if !current.has_any_available() {
            return Err(ScanError::NoUsableFeatures {
                start: current_start,
                end: len,
                min_valid: MIN_VALID_POINTS,
            }
            .into());
        }
        let usable = current.available_kinds();

        // Candidate starts cover every placement with full warm-up that
        // cannot overlap the current window.
        let last_start = len - 2 * window;
        let total_candidates = last_start - warmup + 1;
        let mut progress = ProgressTracker::new(&self.config);
        let allowance = progress.allowance(total_candidates);
        let budget_exhausted = progress.exhausted_by(total_candidates);
        if budget_exhausted {
            warn!(
                total = total_candidates,
                scanned = allowance,
                "candidate budget exhausted; scan fails closed with a truncated enumeration"
            );
        }
        let starts: Vec<usize> = (warmup..=last_start).take(allowance).collect();

        if !self.config.quiet {
            info!(
                bars = len,
                window,
                candidates = starts.len(),
                features = ?usable.iter().map(|kind| kind.name()).collect::<Vec<_>>(),
                workers = self.config.n_workers,
                "Scanning history for shape matches"
            );
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.n_workers)
            .build()
            .context("Failed to build scan thread pool")?;

        // Each candidate evaluation reads only the shared signal matrix and
        // the current window's normalized features; results merge at the
        // end, so the map is safe to run in parallel.
        let mut retained: Vec<(usize, DistanceResult)> = pool.install(|| {
            starts
                .par_iter()
                .filter_map(|&start| {
                    let candidate = WindowFeatures::extract(
                        &self.matrix,
                        &self.kinds,
                        start,
                        start + window,
                    );
                    compare_windows(&current, &candidate, &self.weights, self.kinds.len())
                        .filter(|result| result.aggregate < self.config.threshold)
                        .map(|result| (start, result))
                })
                .collect()
        });
        progress.record(starts.len());

        // Stable sort keeps earliest-in-history ordering for equal distances.
        retained.sort_by(|a, b| {
            a.1.aggregate
                .partial_cmp(&b.1.aggregate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        retained.truncate(self.config.top_n);

        let matches: Vec<MatchRecord> = retained
            .into_iter()
            .enumerate()
            .map(|(index, (start, result))| {
                let end = start + window;
                let outcomes = forward_returns(self.series.close(), end, &self.config.horizons);
                MatchRecord::new(index + 1, self.span(start, end), result, outcomes)
            })
            .collect();

        let per_match: Vec<_> = matches
            .iter()
            .map(|record| record.forward_returns.clone())
            .collect();
        let horizon_summaries = summarize_horizons(&per_match, &self.config.horizons);

        let suggestion = matches
            .is_empty()
            .then(|| ScanReport::no_match_suggestion(self.config.threshold, window));

        Ok(ScanReport {
            current_window: self.span(current.start, current.end),
            window,
            threshold: self.config.threshold,
            features_used: usable.iter().map(|kind| kind.name().to_string()).collect(),
            weights: self
                .weights
                .entries()
                .iter()
                .map(|(kind, weight)| (kind.name().to_string(), *weight))
                .collect(),
            candidates_scanned: progress.scanned(),
            budget_exhausted,
            matches,
            horizon_summaries,
            suggestion,
        })
    }

    fn span(&self, start: usize, end: usize) -> WindowSpan {
        WindowSpan {
            start_index: start,
            end_index: end,
            start_date: self.series.timestamp(start),
            end_date: self.series.timestamp(end - 1),
        }
    }
}

fn parse_features(names: &[String]) -> Result<Vec<FeatureKind>> {
    if names.is_empty() {
        return Err(anyhow!("at least one feature must be requested"));
    }
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let kind = FeatureKind::parse(name).ok_or_else(|| {
            anyhow!(
                "unknown feature '{name}'; valid features: {}",
                FeatureKind::ALL
                    .iter()
                    .map(|kind| kind.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        if kinds.contains(&kind) {
            return Err(anyhow!("feature '{name}' requested twice"));
        }
        kinds.push(kind);
    }
    Ok(kinds)
}
