use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use shapesmith_rs::report::log_scan_report;
use shapesmith_rs::{Config, MatchPipeline, PriceSeries, ScanReport};
use signals_rs::FeatureKind;

pub const REPORT_FILE_NAME: &str = "report.json";

#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinScanOptions {
    /// Overwrite an existing report.json in the output directory instead of
    /// refusing to clobber a previous run's artefact.
    pub overwrite_report: bool,
}

/// The builtin feature catalog: every signal the matcher knows, in canonical
/// order. Used when the caller does not narrow the feature list.
pub fn default_feature_names() -> Vec<String> {
    FeatureKind::ALL
        .into_iter()
        .map(|kind| kind.name().to_string())
        .collect()
}

pub fn run_builtin_scan(config: Config) -> Result<ScanReport> {
    run_builtin_scan_with_options(config, BuiltinScanOptions::default())
}

/// Load the price series, run the match pipeline on a dedicated thread, log
/// the report, and persist `report.json` into the output directory.
pub fn run_builtin_scan_with_options(
    config: Config,
    options: BuiltinScanOptions,
) -> Result<ScanReport> {
    let mut config = config;
    if config.features.is_empty() {
        config.features = default_feature_names();
    }

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
    let report_path = config.output_dir.join(REPORT_FILE_NAME);
    if report_path.exists() && !options.overwrite_report {
        return Err(anyhow!(
            "Report already exists at {}. Re-run with --overwrite-report to replace it.",
            report_path.display()
        ));
    }

    let series = PriceSeries::load(&config.input_csv)?
        .filter_by_date_range(config.include_date_start, config.include_date_end);
    info!(
        bars = series.len(),
        path = %config.input_csv.display(),
        "Loaded price series for shape scan"
    );

    let report_mode = config.report_metrics;
    let pipeline_config = config;

    // Run the scan on a dedicated thread with an explicitly enlarged stack:
    // wide windows mean large per-candidate scratch allocations deep in the
    // rayon call tree.
    let builder = std::thread::Builder::new()
        .name("shapesmith-pipeline".to_string())
        .stack_size(32 * 1024 * 1024);

    let handle = builder
        .spawn(move || -> Result<ScanReport> {
            let pipeline = MatchPipeline::new(pipeline_config, series)?;
            pipeline.run()
        })
        .map_err(|err| anyhow!("failed to spawn shapesmith pipeline thread: {err}"))?;

    let report = handle
        .join()
        .map_err(|_| anyhow!("shapesmith pipeline thread panicked"))??;

    log_scan_report(&report, report_mode);
    write_report(&report, &report_path)?;
    info!(path = %report_path.display(), matches = report.matches.len(), "Scan report written");

    Ok(report)
}

fn write_report(report: &ScanReport, path: &PathBuf) -> Result<()> {
    let payload = serde_json::to_string_pretty(report)
        .context("Failed to serialize scan report to JSON")?;
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(payload.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
