use std::path::PathBuf;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use shapesmith_rs::{Config, MatchPipeline, PriceSeries, ReportMetricsMode, ScanError};

fn daily_series(close: Vec<f64>) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..close.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let filler = vec![1.0; close.len()];
    PriceSeries::new(
        timestamps,
        close.clone(),
        close.clone(),
        close.clone(),
        close,
        filler,
    )
    .expect("valid series")
}

fn wavy_close(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 8.0 * (t * 0.35).sin() + 3.0 * (t * 0.11).cos()
        })
        .collect()
}

fn base_config(window: usize, features: &[&str]) -> Config {
    Config {
        input_csv: PathBuf::from("unused.csv"),
        output_dir: PathBuf::from("unused"),
        window,
        features: features.iter().map(|s| s.to_string()).collect(),
        weights: Vec::new(),
        threshold: 1.0,
        top_n: 20,
        horizons: vec![10, 30],
        include_date_start: None,
        include_date_end: None,
        n_workers: 1,
        max_candidates: None,
        quiet: true,
        report_metrics: ReportMetricsMode::Off,
    }
}

#[test]
fn identical_inputs_produce_identical_reports() -> Result<()> {
    let close = wavy_close(250);
    let config = base_config(30, &["price", "momentum"]);

    let first = MatchPipeline::new(config.clone(), daily_series(close.clone()))?.run()?;
    let second = MatchPipeline::new(config, daily_series(close))?.run()?;

    let first_json = serde_json::to_string(&first)?;
    let second_json = serde_json::to_string(&second)?;
    assert_eq!(first_json, second_json);
    Ok(())
}

#[test]
fn parallel_scan_matches_single_threaded_scan() -> Result<()> {
    let close = wavy_close(250);
    let mut parallel_config = base_config(30, &["price", "momentum"]);
    parallel_config.n_workers = 4;

    let single = MatchPipeline::new(base_config(30, &["price", "momentum"]), daily_series(close.clone()))?
        .run()?;
    let parallel = MatchPipeline::new(parallel_config, daily_series(close))?.run()?;

    assert_eq!(
        serde_json::to_string(&single)?,
        serde_json::to_string(&parallel)?
    );
    Ok(())
}

#[test]
fn retained_matches_respect_threshold_and_ordering() -> Result<()> {
    let close = wavy_close(300);
    let mut config = base_config(25, &["price", "momentum"]);
    config.threshold = 1.2;
    config.top_n = 1000;

    let report = MatchPipeline::new(config, daily_series(close))?.run()?;
    assert!(!report.matches.is_empty());

    for pair in report.matches.windows(2) {
        assert!(pair[0].aggregate_distance <= pair[1].aggregate_distance);
    }
    for record in &report.matches {
        assert!(record.aggregate_distance < 1.2, "threshold is strict");
        assert!(record.aggregate_distance >= 0.0);
        // Candidates never overlap the current window.
        assert!(record.span.end_index <= report.current_window.start_index);
    }
    Ok(())
}

#[test]
fn short_history_fails_fast_with_insufficient_history() {
    let close = wavy_close(100);
    let config = base_config(
        30,
        &[
            "price",
            "momentum",
            "trend_slope",
            "volatility",
            "drawdown_to_high",
        ],
    );

    let err = MatchPipeline::new(config, daily_series(close))
        .expect("construction succeeds")
        .run()
        .unwrap_err();
    match err.downcast_ref::<ScanError>() {
        Some(ScanError::InsufficientHistory {
            required,
            window,
            warmup,
            actual,
        }) => {
            assert_eq!(*window, 30);
            assert_eq!(*warmup, 59);
            assert_eq!(*required, 119);
            assert_eq!(*actual, 100);
        }
        other => panic!("expected InsufficientHistory, got {other:?}"),
    }
}

#[test]
fn all_nan_current_window_fails_with_no_usable_features() {
    let close = vec![f64::NAN; 60];
    let config = base_config(30, &["price"]);

    let err = MatchPipeline::new(config, daily_series(close))
        .expect("construction succeeds")
        .run()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScanError>(),
        Some(ScanError::NoUsableFeatures { .. })
    ));
}

#[test]
fn empty_result_is_a_suggestion_not_an_error() -> Result<()> {
    let close = wavy_close(250);
    let mut config = base_config(30, &["price"]);
    // Nothing repeats exactly in this series, so an (almost) zero threshold
    // retains nothing.
    config.threshold = 1e-12;

    let report = MatchPipeline::new(config, daily_series(close))?.run()?;
    assert!(report.matches.is_empty());
    assert!(report.horizon_summaries.is_empty());
    let suggestion = report.suggestion.expect("suggestion must be present");
    assert!(suggestion.contains("increase"));
    Ok(())
}

#[test]
fn candidate_budget_truncates_deterministically() -> Result<()> {
    let close = wavy_close(300);
    let mut config = base_config(25, &["price"]);
    config.threshold = 5.0;
    config.top_n = 1000;
    config.max_candidates = Some(10);

    let report = MatchPipeline::new(config.clone(), daily_series(close.clone()))?.run()?;
    assert!(report.budget_exhausted);
    assert_eq!(report.candidates_scanned, 10);
    // Only the first ten enumeration slots were considered.
    for record in &report.matches {
        assert!(record.span.start_index < 10);
    }

    let rerun = MatchPipeline::new(config, daily_series(close))?.run()?;
    assert_eq!(
        serde_json::to_string(&report)?,
        serde_json::to_string(&rerun)?
    );
    Ok(())
}

#[test]
fn effective_weights_reflect_padding() -> Result<()> {
    let close = wavy_close(300);
    let mut config = base_config(
        25,
        &[
            "price",
            "momentum",
            "trend_slope",
            "volatility",
            "drawdown_to_high",
        ],
    );
    config.weights = vec![2.0, 3.0];

    let report = MatchPipeline::new(config, daily_series(close))?.run()?;
    assert_eq!(
        report.weights,
        vec![
            ("price".to_string(), 2.0),
            ("momentum".to_string(), 3.0),
            ("trend_slope".to_string(), 1.0),
            ("volatility".to_string(), 1.0),
            ("drawdown_to_high".to_string(), 1.0),
        ]
    );
    Ok(())
}
