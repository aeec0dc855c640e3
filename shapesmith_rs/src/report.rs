use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::ReportMetricsMode;
use crate::distance::DistanceResult;
use crate::stats::{ForwardReturn, HorizonSummary};

/// Date-stamped index range of one window, half-open on the index side.
#[derive(Clone, Debug, Serialize)]
pub struct WindowSpan {
    pub start_index: usize,
    pub end_index: usize,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// One retained historical match, ranked by aggregate distance.
#[derive(Clone, Debug, Serialize)]
pub struct MatchRecord {
    pub rank: usize,
    pub span: WindowSpan,
    pub aggregate_distance: f64,
    pub similarity: f64,
    pub per_feature: Vec<crate::distance::FeatureDistance>,
    /// Present only for horizons with enough future bars.
    pub forward_returns: Vec<ForwardReturn>,
}

impl MatchRecord {
    pub fn new(
        rank: usize,
        span: WindowSpan,
        result: DistanceResult,
        forward_returns: Vec<ForwardReturn>,
    ) -> Self {
        Self {
            rank,
            span,
            aggregate_distance: result.aggregate,
            similarity: result.similarity,
            per_feature: result.per_feature,
            forward_returns,
        }
    }
}

/// The full structured result of one scan invocation. Serialized as
/// `report.json`; also renderable into the log.
#[derive(Clone, Debug, Serialize)]
pub struct ScanReport {
    pub current_window: WindowSpan,
    pub window: usize,
    pub threshold: f64,
    /// Features with a usable normalized sequence in the current window.
    pub features_used: Vec<String>,
    /// Effective (feature, weight) pairs after padding resolution.
    pub weights: Vec<(String, f64)>,
    pub candidates_scanned: usize,
    /// True when the iteration budget truncated the enumeration.
    pub budget_exhausted: bool,
    pub matches: Vec<MatchRecord>,
    pub horizon_summaries: Vec<HorizonSummary>,
    /// Human-readable guidance, set only when no candidate passed the
    /// threshold.
    pub suggestion: Option<String>,
}

impl ScanReport {
    pub fn no_match_suggestion(threshold: f64, window: usize) -> String {
        format!(
            "no candidate window scored below threshold {threshold}; \
             increase --threshold or decrease --window (currently {window})"
        )
    }
}

/// Render the report into the log, honoring the configured verbosity.
pub fn log_scan_report(report: &ScanReport, mode: ReportMetricsMode) {
    if !mode.should_report() {
        return;
    }

    if report.matches.is_empty() {
        info!(
            candidates = report.candidates_scanned,
            "No historical matches below threshold"
        );
        if let Some(suggestion) = &report.suggestion {
            info!("{suggestion}");
        }
        return;
    }

    let mut buffer = String::new();
    let _ = writeln!(
        buffer,
        "\n\u{1F4C8} TOP {} SHAPE MATCHES (current window {} -> {}):",
        report.matches.len(),
        report.current_window.start_date.date_naive(),
        report.current_window.end_date.date_naive(),
    );
    let _ = writeln!(
        buffer,
        "======================================================================\n"
    );

    if mode.is_full() {
        for record in &report.matches {
            let _ = writeln!(
                buffer,
                "Rank {}: {} -> {}",
                record.rank,
                record.span.start_date.date_naive(),
                record.span.end_date.date_naive(),
            );
            let _ = writeln!(
                buffer,
                "  Distance: {:.4} | Similarity: {:.4}",
                record.aggregate_distance, record.similarity
            );
            let feature_parts: Vec<String> = record
                .per_feature
                .iter()
                .map(|fd| format!("{} {:.4} (w {:.1})", fd.feature.name(), fd.distance, fd.weight))
                .collect();
            let _ = writeln!(buffer, "  Features: {}", feature_parts.join(" | "));
            if record.forward_returns.is_empty() {
                let _ = writeln!(buffer, "  Forward: (window too close to end of history)");
            } else {
                let return_parts: Vec<String> = record
                    .forward_returns
                    .iter()
                    .map(|r| format!("+{}b {:+.2}%", r.horizon, r.return_pct))
                    .collect();
                let _ = writeln!(buffer, "  Forward: {}", return_parts.join(" | "));
            }
        }
    }

    if !report.horizon_summaries.is_empty() {
        let _ = writeln!(buffer, "\nWhat happened next across matches:");
        for summary in &report.horizon_summaries {
            let _ = writeln!(
                buffer,
                "  +{}b: mean {:+.2}% | median {:+.2}% | min {:+.2}% | max {:+.2}% ({} obs)",
                summary.horizon,
                summary.mean_pct,
                summary.median_pct,
                summary.min_pct,
                summary.max_pct,
                summary.count
            );
        }
    }

    if report.budget_exhausted {
        let _ = writeln!(
            buffer,
            "\n\u{26A0} candidate budget exhausted: only the first {} candidates were scanned",
            report.candidates_scanned
        );
    }

    info!("{}", buffer);
}
