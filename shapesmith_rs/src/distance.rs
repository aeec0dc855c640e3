use serde::Serialize;

use signals_rs::FeatureKind;

use crate::dtw::dtw_distance;
use crate::feature::{FeatureWeights, WindowFeatures};

const WEIGHT_EPSILON: f64 = 1e-12;

/// One feature's contribution to a window comparison.
#[derive(Clone, Debug, Serialize)]
pub struct FeatureDistance {
    #[serde(serialize_with = "serialize_kind")]
    pub feature: FeatureKind,
    /// Length-normalized DTW distance for this feature pair.
    pub distance: f64,
    pub weight: f64,
}

/// Full outcome of comparing the current window against one candidate.
#[derive(Clone, Debug, Serialize)]
pub struct DistanceResult {
    /// Weighted mean of the per-feature distances.
    pub aggregate: f64,
    /// `1 / (1 + aggregate)`, in (0, 1].
    pub similarity: f64,
    /// Per-feature breakdown, in request order, for explainability.
    pub per_feature: Vec<FeatureDistance>,
}

fn serialize_kind<S>(kind: &FeatureKind, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(kind.name())
}

/// Combine per-feature DTW distances into one weighted score.
///
/// Only features usable on BOTH sides take part; a one-sided feature is
/// silently dropped from the pair rather than failing the comparison. When
/// fewer than half of the requested features are jointly usable the
/// candidate has no comparable basis and is rejected (`None`), as is a
/// comparison whose usable weights sum to ~0.
pub fn compare_windows(
    current: &WindowFeatures,
    candidate: &WindowFeatures,
    weights: &FeatureWeights,
    requested: usize,
) -> Option<DistanceResult> {
    let mut per_feature: Vec<FeatureDistance> = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for &(kind, weight) in weights.entries() {
        let (Some(a), Some(b)) = (
            current.get(kind).and_then(|f| f.available()),
            candidate.get(kind).and_then(|f| f.available()),
        ) else {
            continue;
        };
        let distance = dtw_distance(a, b);
        per_feature.push(FeatureDistance {
            feature: kind,
            distance,
            weight,
        });
        weighted_sum += distance * weight;
        weight_sum += weight;
    }

    if per_feature.len() * 2 < requested {
        return None;
    }
    if weight_sum < WEIGHT_EPSILON {
        return None;
    }

    let aggregate = weighted_sum / weight_sum;
    Some(DistanceResult {
        aggregate,
        similarity: 1.0 / (1.0 + aggregate),
        per_feature,
    })
}
