use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::report_mode::ReportMetricsValue;
use shapesmith_rs::Config;

#[derive(Parser, Debug)]
#[command(
    name = "shapesmith",
    about = "Multi-feature historical shape matcher for price series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan history for windows shaped like the most recent one
    #[command(name = "scan")]
    Scan(ScanArgs),
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Path to the input CSV file with OHLCV data
    #[arg(long = "csv", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub csv_path: PathBuf,

    /// Output directory for the scan report and log file
    #[arg(long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Window length W in bars; the most recent W bars form the pattern to
    /// match against history
    #[arg(long = "window", default_value_t = 30)]
    pub window: usize,

    /// Comma-delimited feature names (price, momentum, trend_slope,
    /// volatility, drawdown_to_high). Omit to use the full builtin catalog.
    #[arg(long = "features", value_delimiter = ',', num_args = 0..)]
    pub features: Vec<String>,

    /// Comma-delimited weights parallel to --features. A shorter list is
    /// padded with weight 1.0 (logged as a warning).
    #[arg(long = "weights", value_delimiter = ',', num_args = 0..)]
    pub weights: Vec<f64>,

    /// Maximum aggregate distance for a candidate window to be retained
    #[arg(long = "threshold", default_value_t = 2.0)]
    pub threshold: f64,

    /// Number of ranked matches to keep in the report
    #[arg(long = "top-k", alias = "top-n", default_value_t = 10)]
    pub top_k: usize,

    /// Comma-delimited forward-return horizons, in bars after a match
    #[arg(long = "horizons", value_delimiter = ',', num_args = 0.., default_values_t = vec![30usize, 60, 90])]
    pub horizons: Vec<usize>,

    /// Inclusive start date filter (YYYY-MM-DD)
    #[arg(long = "date-start")]
    pub date_start: Option<String>,

    /// Inclusive end date filter (YYYY-MM-DD)
    #[arg(long = "date-end")]
    pub date_end: Option<String>,

    /// Number of worker threads (omit to use all logical cores)
    #[arg(long = "workers", alias = "n-jobs")]
    pub workers: Option<usize>,

    /// Optional cap on candidate windows to evaluate this run. When the
    /// enumeration is larger, the scan is truncated and the report flagged.
    #[arg(long = "max-candidates", alias = "limit")]
    pub max_candidates: Option<usize>,

    /// Reduce log noise (suppresses the scan overview)
    #[arg(long = "quiet", default_value_t = false)]
    pub quiet: bool,

    /// Control final report emission
    #[arg(
        long = "report",
        alias = "report-metrics",
        value_enum,
        default_value = "full"
    )]
    pub report_metrics: ReportMetricsValue,

    /// Overwrite an existing report.json in the output directory
    #[arg(long = "overwrite-report", default_value_t = false)]
    pub overwrite_report: bool,

    /// Disable writing shapesmith.log into the output directory. When set,
    /// logs are only emitted to stdout/stderr.
    #[arg(long = "no-file-log", default_value_t = false)]
    pub no_file_log: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Cli as Parser>::parse()
    }
}

impl ScanArgs {
    pub fn into_config(self) -> Result<Config> {
        let include_date_start = parse_optional_date(self.date_start.as_deref())?;
        let include_date_end = parse_optional_date(self.date_end.as_deref())?;

        if self.window == 0 {
            return Err(anyhow!("--window must be >= 1"));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(anyhow!("--threshold must be a positive number"));
        }
        if self.horizons.iter().any(|&h| h == 0) {
            return Err(anyhow!("--horizons entries must be >= 1"));
        }
        if let (Some(start), Some(end)) = (include_date_start, include_date_end) {
            if start > end {
                return Err(anyhow!("--date-start must not be after --date-end"));
            }
        }

        Ok(Config {
            input_csv: self.csv_path,
            output_dir: self.output_dir,
            window: self.window,
            features: self.features,
            weights: self.weights,
            threshold: self.threshold,
            top_n: self.top_k.max(1),
            horizons: self.horizons,
            include_date_start,
            include_date_end,
            n_workers: normalize_workers(self.workers),
            max_candidates: self.max_candidates,
            quiet: self.quiet,
            report_metrics: self.report_metrics.to_mode(),
        })
    }
}

fn normalize_workers(workers: Option<usize>) -> usize {
    // Zero lets the scan pool fall back to all logical cores.
    workers.unwrap_or(0)
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        Some(raw) => {
            let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("Invalid date format for {raw}. Expected YYYY-MM-DD"))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
