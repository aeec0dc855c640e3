mod indicators;

pub use indicators::{drawdown_to_high, momentum_rsi, rolling_volatility, trend_slope_pct};

/// The closed set of signals the matcher can compare windows on.
///
/// Each kind knows its warm-up (the number of leading bars that come out as
/// NaN because the underlying lookback cannot be satisfied yet). Window
/// placement in the scanner starts after the longest warm-up among the
/// requested kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// Raw close price.
    Price,
    /// Wilder-smoothed RSI on a 0-100 scale.
    Momentum,
    /// Least-squares slope of close over a rolling lookback, as % of close.
    TrendSlope,
    /// Annualized rolling standard deviation of 1-bar returns, in %.
    Volatility,
    /// % distance of close below its rolling maximum; always <= 0.
    DrawdownToHigh,
}

pub const MOMENTUM_PERIOD: usize = 14;
pub const TREND_SLOPE_PERIOD: usize = 20;
pub const VOLATILITY_PERIOD: usize = 20;
pub const DRAWDOWN_PERIOD: usize = 60;

impl FeatureKind {
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::Price,
        FeatureKind::Momentum,
        FeatureKind::TrendSlope,
        FeatureKind::Volatility,
        FeatureKind::DrawdownToHigh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Price => "price",
            FeatureKind::Momentum => "momentum",
            FeatureKind::TrendSlope => "trend_slope",
            FeatureKind::Volatility => "volatility",
            FeatureKind::DrawdownToHigh => "drawdown_to_high",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        FeatureKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
    }

    /// Number of leading bars whose value is NaN for this signal.
    pub fn warmup(self) -> usize {
        match self {
            FeatureKind::Price => 0,
            // RSI needs `period` changes before the smoothed averages settle.
            FeatureKind::Momentum => MOMENTUM_PERIOD,
            FeatureKind::TrendSlope => TREND_SLOPE_PERIOD - 1,
            // Returns start at bar 1, then a full std window on top.
            FeatureKind::Volatility => VOLATILITY_PERIOD,
            FeatureKind::DrawdownToHigh => DRAWDOWN_PERIOD - 1,
        }
    }

    fn slot(self) -> usize {
        match self {
            FeatureKind::Price => 0,
            FeatureKind::Momentum => 1,
            FeatureKind::TrendSlope => 2,
            FeatureKind::Volatility => 3,
            FeatureKind::DrawdownToHigh => 4,
        }
    }
}

/// Longest warm-up among the given kinds; zero for an empty set.
pub fn max_warmup(kinds: &[FeatureKind]) -> usize {
    kinds.iter().map(|kind| kind.warmup()).max().unwrap_or(0)
}

/// One full-history vector per requested signal, aligned 1:1 with the close
/// series the matrix was derived from. Unrequested slots stay empty.
#[derive(Clone, Debug)]
pub struct SignalMatrix {
    len: usize,
    slots: [Option<Vec<f64>>; 5],
}

impl SignalMatrix {
    /// Derive the requested signals over the entire close series.
    ///
    /// Derivation is a pure function of the input: bars inside a signal's
    /// warm-up (or windows containing non-finite closes) come out as NaN
    /// rather than failing.
    pub fn from_close(close: &[f64], kinds: &[FeatureKind]) -> Self {
        let mut slots: [Option<Vec<f64>>; 5] = [None, None, None, None, None];
        for &kind in kinds {
            if slots[kind.slot()].is_some() {
                continue;
            }
            let values = match kind {
                FeatureKind::Price => close.to_vec(),
                FeatureKind::Momentum => momentum_rsi(close, MOMENTUM_PERIOD),
                FeatureKind::TrendSlope => trend_slope_pct(close, TREND_SLOPE_PERIOD),
                FeatureKind::Volatility => rolling_volatility(close, VOLATILITY_PERIOD),
                FeatureKind::DrawdownToHigh => drawdown_to_high(close, DRAWDOWN_PERIOD),
            };
            slots[kind.slot()] = Some(values);
        }
        Self {
            len: close.len(),
            slots,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn signal(&self, kind: FeatureKind) -> Option<&[f64]> {
        self.slots[kind.slot()].as_deref()
    }

    /// Kinds actually present in this matrix, in canonical order.
    pub fn kinds(&self) -> Vec<FeatureKind> {
        FeatureKind::ALL
            .into_iter()
            .filter(|kind| self.slots[kind.slot()].is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_canonical_names() {
        for kind in FeatureKind::ALL {
            assert_eq!(FeatureKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(FeatureKind::parse("rsi"), None);
    }

    #[test]
    fn matrix_only_fills_requested_slots() {
        let close: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let matrix = SignalMatrix::from_close(&close, &[FeatureKind::Price, FeatureKind::Momentum]);
        assert!(matrix.signal(FeatureKind::Price).is_some());
        assert!(matrix.signal(FeatureKind::Momentum).is_some());
        assert!(matrix.signal(FeatureKind::Volatility).is_none());
        assert_eq!(
            matrix.kinds(),
            vec![FeatureKind::Price, FeatureKind::Momentum]
        );
    }

    #[test]
    fn max_warmup_is_drawdown_when_all_requested() {
        assert_eq!(max_warmup(&FeatureKind::ALL), DRAWDOWN_PERIOD - 1);
        assert_eq!(max_warmup(&[FeatureKind::Price]), 0);
        assert_eq!(max_warmup(&[]), 0);
    }
}
