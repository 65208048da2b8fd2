//! External model seam
//!
//! A trained classifier can refine a comparison. It sees a flat, named
//! feature vector per capture and a pairwise difference vector; the engine
//! blends its genuine-probability into the similarity score. Nothing here
//! depends on a particular model or transport.

use crate::error::ComputeError;
use crate::scorer::SimilarityScorer;
use crate::types::{BiometricFeatureSet, ComparisonResult, ReasonCode, Recommendation};
use serde::{Deserialize, Serialize};

/// Names of the flat feature vector, in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "stroke_count",
    "total_points",
    "total_duration_ms",
    "avg_points_per_stroke",
    "avg_velocity",
    "max_velocity",
    "min_velocity",
    "velocity_std",
    "width",
    "height",
    "area",
    "aspect_ratio",
    "center_x",
    "center_y",
    "avg_stroke_length",
    "total_length",
    "length_variation",
    "avg_stroke_duration",
    "duration_variation",
];

pub const FEATURE_COUNT: usize = 19;

/// Leading features compared by absolute rather than relative difference
const COUNT_FEATURES: usize = 2;

/// Probability at or above which a prediction counts as genuine
pub const GENUINE_THRESHOLD: f64 = 0.5;

/// Flat numeric view of a feature set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_feature_set(features: &BiometricFeatureSet) -> Self {
        let basic = &features.basic;
        let timing = &features.timing;
        let geometry = &features.geometry;
        let (center_x, center_y) = geometry.bounding_box.center();

        Self([
            basic.stroke_count as f64,
            basic.total_points as f64,
            timing.total_duration,
            basic.average_points_per_stroke,
            timing.mean_segment_speed,
            timing.max_speed,
            timing.min_speed,
            timing.speed_std,
            geometry.bounding_box.width,
            geometry.bounding_box.height,
            geometry.area,
            geometry.aspect_ratio,
            center_x,
            center_y,
            geometry.average_stroke_length,
            geometry.total_path_length,
            geometry.stroke_length_std,
            geometry.average_stroke_duration,
            geometry.stroke_duration_std,
        ])
    }

    /// `(name, value)` pairs
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

/// Per-feature difference between a candidate and a stored sample.
///
/// Counts use `|c - s|`; everything else `|c - s| / |s|`, which is 1 when the
/// stored value is 0 and the candidate is not.
pub fn difference_vector(candidate: &FeatureVector, stored: &FeatureVector) -> FeatureVector {
    let mut out = [0.0; FEATURE_COUNT];
    for (i, slot) in out.iter_mut().enumerate() {
        let c = candidate.0[i];
        let s = stored.0[i];
        *slot = if i < COUNT_FEATURES {
            (c - s).abs()
        } else if s != 0.0 {
            ((c - s) / s).abs()
        } else if c != 0.0 {
            1.0
        } else {
            0.0
        };
    }
    FeatureVector(out)
}

/// Output of an external classifier.
///
/// Built only through [`MlPrediction::new`] (deserialization included), so the
/// probability is always finite and within 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PredictionPayload")]
pub struct MlPrediction {
    genuine_probability: f64,
}

#[derive(Deserialize)]
struct PredictionPayload {
    genuine_probability: f64,
}

impl From<PredictionPayload> for MlPrediction {
    fn from(payload: PredictionPayload) -> Self {
        Self::new(payload.genuine_probability)
    }
}

impl MlPrediction {
    pub fn new(genuine_probability: f64) -> Self {
        let p = if genuine_probability.is_finite() {
            genuine_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            genuine_probability: p,
        }
    }

    /// Probability (0-1) that the candidate is genuine
    pub fn genuine_probability(&self) -> f64 {
        self.genuine_probability
    }

    pub fn is_genuine(&self) -> bool {
        self.genuine_probability >= GENUINE_THRESHOLD
    }
}

/// A pairwise classifier over difference vectors
pub trait MlComparator: Send + Sync {
    fn predict(&self, difference: &FeatureVector) -> Result<MlPrediction, ComputeError>;
}

/// Blend a prediction into a comparison.
///
/// `score' = (1 - weight) · score + weight · p`, with the recommendation
/// re-derived from the blended score. `ml_disagreement` is added when the
/// model and the engine's own decision point in opposite directions.
/// Results that could not be scored are returned unchanged.
pub fn blend(
    scorer: &SimilarityScorer,
    result: &ComparisonResult,
    prediction: MlPrediction,
    weight: f64,
) -> ComparisonResult {
    if result.reasons.contains(&ReasonCode::InsufficientData) {
        return result.clone();
    }

    let weight = if weight.is_finite() { weight.clamp(0.0, 1.0) } else { 0.0 };
    let score = ((1.0 - weight) * result.score + weight * prediction.genuine_probability())
        .clamp(0.0, 1.0);

    let mut reasons = result.reasons.clone();
    let disagrees = match result.recommendation {
        Recommendation::Accept => !prediction.is_genuine(),
        Recommendation::Reject => prediction.is_genuine(),
        Recommendation::Review => false,
    };
    if disagrees && !reasons.contains(&ReasonCode::MlDisagreement) {
        reasons.push(ReasonCode::MlDisagreement);
    }

    let mut match_details = result.match_details;
    match_details.overall = score;

    ComparisonResult {
        score,
        confidence: result.confidence,
        match_details,
        recommendation: scorer.recommend(score),
        reasons,
    }
}
