use clap::ValueEnum;

use shapesmith_rs::ReportMetricsMode;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ReportMetricsValue {
    Full,
    Summary,
    Off,
}

impl ReportMetricsValue {
    pub fn to_mode(self) -> ReportMetricsMode {
        match self {
            ReportMetricsValue::Full => ReportMetricsMode::Full,
            ReportMetricsValue::Summary => ReportMetricsMode::Summary,
            ReportMetricsValue::Off => ReportMetricsMode::Off,
        }
    }
}
