use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_csv: PathBuf,
    pub output_dir: PathBuf,
    /// Fixed window length W, in bars. The most recent W bars form the
    /// current window; every candidate window has the same length.
    pub window: usize,
    /// Requested feature names (subset of the five signal names). Order is
    /// preserved so a parallel --weights list lines up positionally.
    pub features: Vec<String>,
    /// Parallel per-feature weights. A shorter list is padded with
    /// `default_feature_weight` (the reference padding behavior); the engine
    /// warns about every padded entry.
    #[serde(default)]
    pub weights: Vec<f64>,
    /// Candidates with aggregate distance strictly below this value are
    /// retained.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Number of ranked matches kept in the result.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Forward-return horizons, in bars after a candidate window's end.
    #[serde(default = "default_horizons")]
    pub horizons: Vec<usize>,
    /// Inclusive start-date filter applied when loading the price series.
    pub include_date_start: Option<NaiveDate>,
    /// Inclusive end-date filter applied when loading the price series.
    pub include_date_end: Option<NaiveDate>,
    /// Worker threads for the candidate scan; 0 uses all logical cores.
    #[serde(default)]
    pub n_workers: usize,
    /// Optional iteration budget: at most this many candidate windows are
    /// evaluated. When the enumeration is larger, the scan fails closed by
    /// truncating the candidate list and flagging the report.
    #[serde(default)]
    pub max_candidates: Option<usize>,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub report_metrics: ReportMetricsMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportMetricsMode {
    /// Emit the full ranked match block with per-feature breakdowns.
    #[default]
    Full,
    /// Emit only the cross-match horizon summary.
    Summary,
    /// Disable report logging entirely (the structured record is still built).
    Off,
}

impl ReportMetricsMode {
    pub fn should_report(self) -> bool {
        !matches!(self, ReportMetricsMode::Off)
    }

    pub fn is_full(self) -> bool {
        matches!(self, ReportMetricsMode::Full)
    }
}

pub const fn default_feature_weight() -> f64 {
    1.0
}

const fn default_threshold() -> f64 {
    2.0
}

const fn default_top_n() -> usize {
    10
}

fn default_horizons() -> Vec<usize> {
    vec![30, 60, 90]
}
