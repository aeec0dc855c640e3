use crate::config::Config;

/// Tracks how much of the candidate enumeration the scan is allowed to
/// cover. The limit is the engine's fail-closed cancellation mechanism: a
/// scan never blocks past its budget, it just stops enumerating.
#[derive(Debug)]
pub struct ProgressTracker {
    scanned: usize,
    limit: Option<usize>,
}

impl ProgressTracker {
    pub fn new(config: &Config) -> Self {
        Self {
            scanned: 0,
            limit: config.max_candidates,
        }
    }

    /// How many of `total` candidates may be evaluated under the budget.
    pub fn allowance(&self, total: usize) -> usize {
        self.limit.map_or(total, |limit| total.min(limit))
    }

    /// True when the budget cut the enumeration short.
    pub fn exhausted_by(&self, total: usize) -> bool {
        self.limit.is_some_and(|limit| total > limit)
    }

    pub fn record(&mut self, evaluated: usize) {
        self.scanned += evaluated;
    }

    pub fn scanned(&self) -> usize {
        self.scanned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportMetricsMode;
    use std::path::PathBuf;

    fn config_with_budget(max_candidates: Option<usize>) -> Config {
        Config {
            input_csv: PathBuf::from("prices.csv"),
            output_dir: PathBuf::from("out"),
            window: 30,
            features: vec!["price".to_string()],
            weights: Vec::new(),
            threshold: 2.0,
            top_n: 10,
            horizons: vec![30],
            include_date_start: None,
            include_date_end: None,
            n_workers: 1,
            max_candidates,
            quiet: false,
            report_metrics: ReportMetricsMode::Off,
        }
    }

    #[test]
    fn unbounded_budget_allows_everything() {
        let tracker = ProgressTracker::new(&config_with_budget(None));
        assert_eq!(tracker.allowance(1000), 1000);
        assert!(!tracker.exhausted_by(1000));
    }

    #[test]
    fn budget_truncates_and_reports_exhaustion() {
        let mut tracker = ProgressTracker::new(&config_with_budget(Some(250)));
        assert_eq!(tracker.allowance(1000), 250);
        assert!(tracker.exhausted_by(1000));
        assert!(!tracker.exhausted_by(250));
        tracker.record(250);
        assert_eq!(tracker.scanned(), 250);
    }
}
