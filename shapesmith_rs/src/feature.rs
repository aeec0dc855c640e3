use tracing::warn;

use signals_rs::{FeatureKind, SignalMatrix};

use crate::config::default_feature_weight;

/// Minimum valid (finite) observations a window must contribute before a
/// feature takes part in a comparison.
pub const MIN_VALID_POINTS: usize = 20;

const STD_EPSILON: f64 = 1e-12;

/// Why a feature produced no usable sequence for a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The signal was never derived (not part of the matrix).
    MissingSignal,
    /// Fewer than [`MIN_VALID_POINTS`] finite observations in the window.
    InsufficientData { valid: usize },
}

/// Outcome of normalizing one feature over one window. A tagged value rather
/// than a NaN sentinel, so aggregation can never mistake "missing" for zero.
#[derive(Clone, Debug)]
pub enum WindowFeature {
    Available(Vec<f64>),
    Unavailable(UnavailableReason),
}

impl WindowFeature {
    pub fn available(&self) -> Option<&[f64]> {
        match self {
            WindowFeature::Available(values) => Some(values),
            WindowFeature::Unavailable(_) => None,
        }
    }
}

/// The normalized feature map for a single window placement.
#[derive(Clone, Debug)]
pub struct WindowFeatures {
    pub start: usize,
    pub end: usize,
    entries: Vec<(FeatureKind, WindowFeature)>,
}

impl WindowFeatures {
    /// Slice every requested signal to `[start, end)`, drop non-finite
    /// points, and z-score what remains. Features with too few valid points
    /// are carried as `Unavailable` instead of failing the window.
    pub fn extract(
        matrix: &SignalMatrix,
        kinds: &[FeatureKind],
        start: usize,
        end: usize,
    ) -> Self {
        let entries = kinds
            .iter()
            .map(|&kind| {
                let feature = match matrix.signal(kind) {
                    None => WindowFeature::Unavailable(UnavailableReason::MissingSignal),
                    Some(signal) => normalize_window(&signal[start..end]),
                };
                (kind, feature)
            })
            .collect();
        Self {
            start,
            end,
            entries,
        }
    }

    pub fn get(&self, kind: FeatureKind) -> Option<&WindowFeature> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, feature)| feature)
    }

    /// Kinds with a usable normalized sequence, in request order.
    pub fn available_kinds(&self) -> Vec<FeatureKind> {
        self.entries
            .iter()
            .filter(|(_, feature)| feature.available().is_some())
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn has_any_available(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, feature)| feature.available().is_some())
    }
}

/// Z-score the finite points of one windowed signal.
///
/// A zero-variance window (a flat line) normalizes to all zeros: two flat
/// windows must compare as identical, and dividing by a ~0 standard
/// deviation would turn them into NaN noise instead.
fn normalize_window(window: &[f64]) -> WindowFeature {
    let valid: Vec<f64> = window.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.len() < MIN_VALID_POINTS {
        return WindowFeature::Unavailable(UnavailableReason::InsufficientData {
            valid: valid.len(),
        });
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    if std < STD_EPSILON {
        return WindowFeature::Available(vec![0.0; valid.len()]);
    }
    WindowFeature::Available(valid.iter().map(|v| (v - mean) / std).collect())
}

/// Effective per-feature weights for one invocation.
#[derive(Clone, Debug)]
pub struct FeatureWeights {
    entries: Vec<(FeatureKind, f64)>,
}

impl FeatureWeights {
    /// Pair requested kinds with the parallel weight list.
    ///
    /// A shorter weight list is padded with the default weight — the
    /// reference behavior — but every padded feature is named in a warning
    /// so a truncated configuration cannot pass silently. Extra weights
    /// beyond the feature list are ignored, also with a warning.
    pub fn resolve(kinds: &[FeatureKind], weights: &[f64]) -> Self {
        let entries: Vec<(FeatureKind, f64)> = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let weight = weights.get(i).copied().unwrap_or(default_feature_weight());
                (kind, weight)
            })
            .collect();

        if weights.len() < kinds.len() {
            let padded: Vec<&str> = kinds[weights.len()..]
                .iter()
                .map(|kind| kind.name())
                .collect();
            warn!(
                default = default_feature_weight(),
                "weight list shorter than feature list; padded {} with the default weight",
                padded.join(", ")
            );
        } else if weights.len() > kinds.len() {
            warn!(
                extra = weights.len() - kinds.len(),
                "weight list longer than feature list; extra weights ignored"
            );
        }

        Self { entries }
    }

    pub fn get(&self, kind: FeatureKind) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, weight)| *weight)
    }

    pub fn entries(&self) -> &[(FeatureKind, f64)] {
        &self.entries
    }
}
