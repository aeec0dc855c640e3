use std::fmt::Write as _;
use std::fs;

use anyhow::Result;
use chrono::NaiveDate;
use shapesmith_rs::{Config, ReportMetricsMode};
use shapesmith_builtin::{BuiltinScanOptions, run_builtin_scan, run_builtin_scan_with_options};
use tempfile::tempdir;

fn write_sine_csv(path: &std::path::Path, bars: usize) -> Result<()> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for i in 0..bars {
        let date = start + chrono::Duration::days(i as i64);
        let close = 100.0 + (i as f64 * 0.35).sin() * 8.0;
        let _ = writeln!(
            csv,
            "{date}T00:00:00Z,{open:.4},{high:.4},{low:.4},{close:.4},{volume}",
            open = close - 0.5,
            high = close + 1.0,
            low = close - 1.0,
            volume = 1_000 + i,
        );
    }
    fs::write(path, csv)?;
    Ok(())
}

fn scan_config(csv: &std::path::Path, out: &std::path::Path) -> Config {
    Config {
        input_csv: csv.to_path_buf(),
        output_dir: out.to_path_buf(),
        window: 25,
        features: vec!["price".to_string()],
        weights: Vec::new(),
        threshold: 2.0,
        top_n: 5,
        horizons: vec![10, 20],
        include_date_start: None,
        include_date_end: None,
        n_workers: 1,
        max_candidates: None,
        quiet: true,
        report_metrics: ReportMetricsMode::Off,
    }
}

#[test]
fn builtin_scan_writes_report_json() -> Result<()> {
    let temp_dir = tempdir()?;
    let csv_path = temp_dir.path().join("prices.csv");
    let output_dir = temp_dir.path().join("out");
    write_sine_csv(&csv_path, 160)?;

    let report = run_builtin_scan(scan_config(&csv_path, &output_dir))?;
    assert!(!report.matches.is_empty());
    assert!(report.suggestion.is_none());

    let report_path = output_dir.join("report.json");
    assert!(report_path.exists());
    let raw = fs::read_to_string(&report_path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(parsed["window"], 25);
    assert_eq!(parsed["features_used"][0], "price");
    Ok(())
}

#[test]
fn existing_report_is_not_clobbered_without_ack() -> Result<()> {
    let temp_dir = tempdir()?;
    let csv_path = temp_dir.path().join("prices.csv");
    let output_dir = temp_dir.path().join("out");
    write_sine_csv(&csv_path, 160)?;

    run_builtin_scan(scan_config(&csv_path, &output_dir))?;
    let err = run_builtin_scan(scan_config(&csv_path, &output_dir)).unwrap_err();
    assert!(err.to_string().contains("--overwrite-report"));

    run_builtin_scan_with_options(
        scan_config(&csv_path, &output_dir),
        BuiltinScanOptions {
            overwrite_report: true,
        },
    )?;
    Ok(())
}

#[test]
fn empty_feature_list_falls_back_to_builtin_catalog() -> Result<()> {
    let temp_dir = tempdir()?;
    let csv_path = temp_dir.path().join("prices.csv");
    let output_dir = temp_dir.path().join("out");
    // Long enough for all five signals: 2 * 25 + 59 warm-up = 109 bars.
    write_sine_csv(&csv_path, 200)?;

    let mut config = scan_config(&csv_path, &output_dir);
    config.features = Vec::new();
    let report = run_builtin_scan(config)?;
    // The effective weight map covers the full builtin catalog.
    assert_eq!(report.weights.len(), 5);
    Ok(())
}
