use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;

const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// An ordered, time-indexed OHLCV series. Immutable once loaded; the match
/// engine only ever reads from it.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    timestamps: Vec<DateTime<Utc>>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from parallel columns. Lengths must agree and
    /// timestamps must be non-decreasing.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self> {
        let len = timestamps.len();
        for (name, column) in [
            ("open", &open),
            ("high", &high),
            ("low", &low),
            ("close", &close),
            ("volume", &volume),
        ] {
            if column.len() != len {
                return Err(anyhow!(
                    "column '{name}' has {} rows, timestamp column has {len}",
                    column.len()
                ));
            }
        }
        if timestamps.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(anyhow!("timestamps must be in non-decreasing order"));
        }
        Ok(Self {
            timestamps,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let lazy = LazyCsvReader::new(path)
            .has_header(true)
            .with_try_parse_dates(true)
            .with_ignore_errors(true)
            .finish()
            .with_context(|| format!("Failed to initialize CSV reader for {}", path.display()))?;

        let df = lazy
            .collect()
            .with_context(|| format!("Failed to collect price data from {}", path.display()))?;

        for col in REQUIRED_COLUMNS {
            if df.column(col).is_err() {
                return Err(anyhow!(
                    "Missing required OHLCV column '{col}' in {}",
                    path.display()
                ));
            }
        }

        let timestamps = extract_timestamps(&df)
            .with_context(|| format!("Failed to read timestamps from {}", path.display()))?;
        let open = series_to_f64(df.column("open")?)?;
        let high = series_to_f64(df.column("high")?)?;
        let low = series_to_f64(df.column("low")?)?;
        let close = series_to_f64(df.column("close")?)?;
        let volume = series_to_f64(df.column("volume")?)?;

        if timestamps.is_empty() {
            return Err(anyhow!("Empty dataset: {}", path.display()));
        }

        Self::new(timestamps, open, high, low, close, volume)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        self.timestamps[index]
    }

    /// Return a new series containing only rows whose calendar date lies
    /// within the optional inclusive [start, end] range. When both bounds
    /// are None, the series is returned unchanged.
    pub fn filter_by_date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        if start.is_none() && end.is_none() {
            return self.clone();
        }

        let keep: Vec<bool> = self
            .timestamps
            .iter()
            .map(|ts| {
                let d = ts.date_naive();
                let mut ok = true;
                if let Some(s) = start {
                    if d < s {
                        ok = false;
                    }
                }
                if let Some(e) = end {
                    if d > e {
                        ok = false;
                    }
                }
                ok
            })
            .collect();

        let retain = |column: &[f64]| -> Vec<f64> {
            column
                .iter()
                .zip(keep.iter())
                .filter(|(_, flag)| **flag)
                .map(|(v, _)| *v)
                .collect()
        };

        Self {
            timestamps: self
                .timestamps
                .iter()
                .zip(keep.iter())
                .filter(|(_, flag)| **flag)
                .map(|(ts, _)| *ts)
                .collect(),
            open: retain(&self.open),
            high: retain(&self.high),
            low: retain(&self.low),
            close: retain(&self.close),
            volume: retain(&self.volume),
        }
    }
}

fn extract_timestamps(df: &DataFrame) -> Result<Vec<DateTime<Utc>>> {
    // Prefer an explicit "timestamp" column when present; otherwise fall
    // back to the first datetime-typed column in the frame.
    let mut series_opt = df.column("timestamp").ok();
    if series_opt.is_none() {
        for candidate in df.get_columns() {
            if matches!(candidate.dtype(), DataType::Datetime(_, _)) {
                series_opt = Some(candidate);
                break;
            }
        }
    }
    let series =
        series_opt.with_context(|| "Missing required timestamp/datetime column")?;

    let mut out: Vec<DateTime<Utc>> = Vec::with_capacity(series.len());
    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let ca = series
                .datetime()
                .with_context(|| "Failed to interpret timestamp column as datetime")?;
            for opt_v in ca.into_iter() {
                let ts = opt_v.with_context(|| "Null timestamp in price data")?;
                let (secs, nsecs) = match unit {
                    TimeUnit::Nanoseconds => (ts / 1_000_000_000, (ts % 1_000_000_000) as u32),
                    TimeUnit::Microseconds => {
                        (ts / 1_000_000, (ts % 1_000_000) as u32 * 1_000)
                    }
                    TimeUnit::Milliseconds => (ts / 1_000, (ts % 1_000) as u32 * 1_000_000),
                };
                let dt = DateTime::<Utc>::from_timestamp(secs, nsecs)
                    .with_context(|| format!("Timestamp {ts} out of range"))?;
                out.push(dt);
            }
        }
        _ => {
            for value in series.iter() {
                let raw = match value {
                    AnyValue::String(s) => s.to_string(),
                    AnyValue::StringOwned(ref s) => s.to_string(),
                    AnyValue::Null => return Err(anyhow!("Null timestamp in price data")),
                    other => {
                        return Err(anyhow!(
                            "Timestamp column must be datetime or UTF-8 strings (got {:?})",
                            other.dtype()
                        ));
                    }
                };
                let parsed = DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("Failed to parse timestamp '{raw}' as RFC3339"))?;
                out.push(parsed.with_timezone(&Utc));
            }
        }
    }
    Ok(out)
}

fn series_to_f64(series: &Series) -> Result<Vec<f64>> {
    match series.dtype() {
        DataType::Float64 => Ok(series
            .f64()
            .context("Failed to interpret as f64")?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect()),
        DataType::Float32 => Ok(series
            .f32()
            .context("Failed to interpret as f32")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::Int64 => Ok(series
            .i64()
            .context("Failed to interpret as i64")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::Int32 => Ok(series
            .i32()
            .context("Failed to interpret as i32")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::UInt64 => Ok(series
            .u64()
            .context("Failed to interpret as u64")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::UInt32 => Ok(series
            .u32()
            .context("Failed to interpret as u32")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        other => Err(anyhow!(
            "Unsupported numeric dtype for {}: {other:?}",
            series.name()
        )),
    }
}
