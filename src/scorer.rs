//! Similarity scoring
//!
//! Compares a reference feature set against a candidate and produces a bounded
//! score, a per-group breakdown, an evidence-based confidence, and an
//! accept/reject/review recommendation.
//!
//! Each feature dimension scores `1 - min(1, distance / tolerance)`; a group's
//! sub-score is the mean of its dimensions, and the overall score is the
//! weighted linear combination of the four groups.

use crate::config::{ScorerConfig, Tolerances};
use crate::features::stats::{finite_or_zero, mean};
use crate::types::{
    BiometricFeatureSet, ComparisonResult, MatchDetails, ReasonCode, Recommendation, Speed,
};

/// Scorer for pairs of feature sets
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    config: ScorerConfig,
}

impl SimilarityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Compare a candidate against a reference.
    ///
    /// Never fails. A side with no points scores 0 in every group and the
    /// result carries `insufficient_data`.
    pub fn compare(
        &self,
        reference: &BiometricFeatureSet,
        candidate: &BiometricFeatureSet,
    ) -> ComparisonResult {
        if reference.is_empty() || candidate.is_empty() {
            return ComparisonResult::rejected(ReasonCode::InsufficientData);
        }

        let tol = &self.config.tolerances;
        let pressure = pressure_similarity(tol, reference, candidate);
        let timing = timing_similarity(tol, reference, candidate);
        let geometry = geometry_similarity(tol, reference, candidate);
        let security = security_similarity(tol, reference, candidate);

        let score = self.weighted_score(pressure, timing, geometry, security);
        let confidence = compute_confidence(self.config.confidence_points, reference, candidate);

        let mut reasons = Vec::new();
        let mismatch = self.config.mismatch_threshold;
        for (sub_score, code) in [
            (pressure, ReasonCode::PressureMismatch),
            (timing, ReasonCode::TimingMismatch),
            (geometry, ReasonCode::GeometryMismatch),
            (security, ReasonCode::SecurityMismatch),
        ] {
            if sub_score < mismatch {
                reasons.push(code);
            }
        }
        if reference.basic.stroke_count != candidate.basic.stroke_count {
            reasons.push(ReasonCode::StrokeCountMismatch);
        }
        if confidence < self.config.low_confidence_threshold {
            reasons.push(ReasonCode::LowConfidence);
        }

        ComparisonResult {
            score,
            confidence,
            match_details: MatchDetails {
                pressure,
                timing,
                geometry,
                security,
                overall: score,
            },
            recommendation: self.recommend(score),
            reasons,
        }
    }

    /// Map a score onto a recommendation.
    ///
    /// The reject threshold is checked first, so a score sitting on a
    /// boundary resolves to the stricter outcome.
    pub fn recommend(&self, score: f64) -> Recommendation {
        if score <= self.config.reject_threshold {
            Recommendation::Reject
        } else if score >= self.config.accept_threshold {
            Recommendation::Accept
        } else {
            Recommendation::Review
        }
    }

    /// `Σ wᵢ·sᵢ / Σ wᵢ`; the weights already sum to 1, dividing keeps a
    /// perfect match at exactly 1
    fn weighted_score(&self, pressure: f64, timing: f64, geometry: f64, security: f64) -> f64 {
        let w = &self.config.weights;
        let total = w.pressure + w.timing + w.geometry + w.security;
        if total <= 0.0 {
            return 0.0;
        }
        let sum =
            w.pressure * pressure + w.timing * timing + w.geometry * geometry + w.security * security;
        finite_or_zero(sum / total).clamp(0.0, 1.0)
    }
}

/// Compare with the default configuration
pub fn compare(reference: &BiometricFeatureSet, candidate: &BiometricFeatureSet) -> ComparisonResult {
    SimilarityScorer::default().compare(reference, candidate)
}

/// Similarity of one dimension: `1 - min(1, distance / tolerance)`
fn similarity(distance: f64, tolerance: f64) -> f64 {
    if !distance.is_finite() || tolerance <= 0.0 {
        return 0.0;
    }
    1.0 - (distance / tolerance).min(1.0)
}

/// `|a - b| / max(|a|, |b|)`, 0 when both are 0
fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

fn speed_similarity(a: Speed, b: Speed, tolerance: f64) -> f64 {
    match (a, b) {
        (Speed::Measured(a), Speed::Measured(b)) => similarity(relative_difference(a, b), tolerance),
        (Speed::Unbounded, Speed::Unbounded) => 1.0,
        _ => 0.0,
    }
}

fn group(scores: &[f64]) -> f64 {
    finite_or_zero(mean(scores).unwrap_or(0.0)).clamp(0.0, 1.0)
}

fn pressure_similarity(
    tol: &Tolerances,
    reference: &BiometricFeatureSet,
    candidate: &BiometricFeatureSet,
) -> f64 {
    let a = &reference.pressure;
    let b = &candidate.pressure;
    let extrema_a = (a.peak_count + a.valley_count) as f64;
    let extrema_b = (b.peak_count + b.valley_count) as f64;

    group(&[
        similarity((a.mean - b.mean).abs(), tol.pressure_mean),
        similarity((a.variance - b.variance).abs(), tol.pressure_variance),
        similarity(((a.max - a.min) - (b.max - b.min)).abs(), tol.pressure_range),
        similarity(relative_difference(extrema_a, extrema_b), tol.pressure_extrema_rel),
    ])
}

fn timing_similarity(
    tol: &Tolerances,
    reference: &BiometricFeatureSet,
    candidate: &BiometricFeatureSet,
) -> f64 {
    let a = &reference.timing;
    let b = &candidate.timing;
    let strokes_a = reference.basic.stroke_count as f64;
    let strokes_b = candidate.basic.stroke_count as f64;

    group(&[
        similarity(relative_difference(a.total_duration, b.total_duration), tol.duration_rel),
        speed_similarity(a.average_speed, b.average_speed, tol.speed_rel),
        similarity((a.rhythm_score - b.rhythm_score).abs(), tol.rhythm),
        similarity((a.consistency_score - b.consistency_score).abs(), tol.speed_consistency),
        similarity((strokes_a - strokes_b).abs(), tol.stroke_count),
    ])
}

fn geometry_similarity(
    tol: &Tolerances,
    reference: &BiometricFeatureSet,
    candidate: &BiometricFeatureSet,
) -> f64 {
    let a = &reference.geometry;
    let b = &candidate.geometry;

    let offset = (a.centroid.x - b.centroid.x).hypot(a.centroid.y - b.centroid.y);
    let diagonal = a.bounding_box.diagonal().max(b.bounding_box.diagonal());
    let centroid = if diagonal > 0.0 {
        similarity(offset / diagonal, tol.centroid)
    } else if offset == 0.0 {
        1.0
    } else {
        0.0
    };

    group(&[
        similarity(relative_difference(a.aspect_ratio, b.aspect_ratio), tol.aspect_ratio_rel),
        similarity(
            relative_difference(a.total_path_length, b.total_path_length),
            tol.path_length_rel,
        ),
        centroid,
        similarity((a.horizontal_symmetry - b.horizontal_symmetry).abs(), tol.symmetry),
        similarity((a.vertical_symmetry - b.vertical_symmetry).abs(), tol.symmetry),
        similarity(
            (mean_abs_turn(&a.turn_angles) - mean_abs_turn(&b.turn_angles)).abs(),
            tol.turning,
        ),
    ])
}

fn security_similarity(
    tol: &Tolerances,
    reference: &BiometricFeatureSet,
    candidate: &BiometricFeatureSet,
) -> f64 {
    let a = &reference.security;
    let b = &candidate.security;

    group(&[
        similarity((a.anomaly_score - b.anomaly_score).abs(), tol.anomaly),
        similarity((a.authenticity_score - b.authenticity_score).abs(), tol.authenticity),
        similarity(
            (a.velocity_consistency - b.velocity_consistency).abs(),
            tol.velocity_consistency,
        ),
        similarity(
            (a.pressure_consistency - b.pressure_consistency).abs(),
            tol.pressure_consistency,
        ),
    ])
}

fn mean_abs_turn(angles: &[f64]) -> f64 {
    if angles.is_empty() {
        return 0.0;
    }
    angles.iter().map(|a| a.abs()).sum::<f64>() / angles.len() as f64
}

/// Evidence available to the comparison.
///
/// Formula: `min(e_ref, e_cand) × min(strokes) / max(strokes)` where
/// `e = min(1, points / confidence_points)`.
pub fn compute_confidence(
    confidence_points: u32,
    reference: &BiometricFeatureSet,
    candidate: &BiometricFeatureSet,
) -> f64 {
    let evidence = |set: &BiometricFeatureSet| {
        (set.basic.total_points as f64 / confidence_points.max(1) as f64).min(1.0)
    };

    let strokes_a = reference.basic.stroke_count;
    let strokes_b = candidate.basic.stroke_count;
    let agreement = if strokes_a.max(strokes_b) == 0 {
        0.0
    } else {
        strokes_a.min(strokes_b) as f64 / strokes_a.max(strokes_b) as f64
    };

    finite_or_zero(evidence(reference).min(evidence(candidate)) * agreement).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract;
    use crate::types::{DeviceType, Point, Stroke, StrokeCollection};

    /// A two-stroke signature-like capture with `n` points per stroke
    fn capture(n: usize, pressure_shift: f64) -> StrokeCollection {
        let stroke = |offset: f64, start: f64| {
            let points = (0..n)
                .map(|i| {
                    let f = i as f64;
                    Point::new(
                        offset + f * 4.0,
                        (f * 0.5).sin() * 15.0 + f,
                        0.3 + 0.2 * (f * 0.8).sin() + pressure_shift,
                        start + f * 12.0 + (f * 1.3).sin() * 3.0,
                    )
                })
                .collect();
            Stroke::new(points, DeviceType::Pen)
        };
        StrokeCollection::new(vec![stroke(0.0, 0.0), stroke(50.0, 2000.0)])
    }

    fn sparse_capture() -> StrokeCollection {
        StrokeCollection::new(vec![
            Stroke::new(vec![Point::new(0.0, 0.0, 0.4, 0.0)], DeviceType::Pen),
            Stroke::new(vec![Point::new(60.0, 20.0, 0.5, 500.0)], DeviceType::Pen),
        ])
    }

    #[test]
    fn test_exact_copy_accepts() {
        let features = extract(&capture(25, 0.0));
        let result = compare(&features, &features.clone());

        assert_eq!(result.score, 1.0);
        assert_eq!(result.recommendation, Recommendation::Accept);
        assert_eq!(result.match_details.overall, 1.0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_self_similarity_on_sparse_capture() {
        let features = extract(&sparse_capture());
        let result = compare(&features, &features);

        assert_eq!(result.score, 1.0);
        assert_eq!(result.recommendation, Recommendation::Accept);
        assert_eq!(result.reasons, vec![ReasonCode::LowConfidence]);
    }

    #[test]
    fn test_pressure_shift_isolated() {
        let reference = extract(&capture(25, 0.0));
        let candidate = extract(&capture(25, 0.3));
        let result = compare(&reference, &candidate);

        assert!(result.match_details.pressure < 0.9);
        assert_eq!(result.match_details.geometry, 1.0);
        assert_eq!(result.match_details.timing, 1.0);
        assert!(result.score < 1.0);
    }

    #[test]
    fn test_confidence_drops_with_sparse_candidate() {
        let reference = extract(&capture(25, 0.0));
        let rich = compare(&reference, &extract(&capture(25, 0.0)));
        let sparse = compare(&reference, &extract(&sparse_capture()));

        assert!(sparse.confidence < rich.confidence);
        assert!(sparse.reasons.contains(&ReasonCode::LowConfidence));
    }

    #[test]
    fn test_comparison_is_symmetric() {
        let a = extract(&capture(25, 0.0));
        let b = extract(&capture(18, 0.1));

        let ab = compare(&a, &b);
        let ba = compare(&b, &a);
        assert_eq!(ab.score, ba.score);
        assert_eq!(ab.confidence, ba.confidence);
        assert_eq!(ab.match_details, ba.match_details);
    }

    #[test]
    fn test_empty_side_is_insufficient_data() {
        let empty = extract(&StrokeCollection::default());
        let full = extract(&capture(10, 0.0));

        for result in [compare(&empty, &full), compare(&full, &empty), compare(&empty, &empty)] {
            assert_eq!(result.score, 0.0);
            assert_eq!(result.confidence, 0.0);
            assert_eq!(result.recommendation, Recommendation::Reject);
            assert_eq!(result.reasons, vec![ReasonCode::InsufficientData]);
        }
    }

    #[test]
    fn test_results_are_bounded() {
        let sets = vec![
            extract(&capture(25, 0.0)),
            extract(&capture(3, 0.4)),
            extract(&sparse_capture()),
            extract(&StrokeCollection::new(vec![Stroke::new(
                vec![
                    Point::new(0.0, 0.0, 0.5, 10.0),
                    Point::new(40.0, 40.0, 0.5, 10.0),
                ],
                DeviceType::Touch,
            )])),
        ];

        for a in &sets {
            for b in &sets {
                let result = compare(a, b);
                assert!((0.0..=1.0).contains(&result.score));
                assert!((0.0..=1.0).contains(&result.confidence));
                for sub in [
                    result.match_details.pressure,
                    result.match_details.timing,
                    result.match_details.geometry,
                    result.match_details.security,
                ] {
                    assert!((0.0..=1.0).contains(&sub));
                }
            }
        }
    }

    #[test]
    fn test_unbounded_speed_pairs() {
        assert_eq!(speed_similarity(Speed::Unbounded, Speed::Unbounded, 0.5), 1.0);
        assert_eq!(speed_similarity(Speed::Unbounded, Speed::Measured(0.2), 0.5), 0.0);
        assert_eq!(speed_similarity(Speed::Measured(0.2), Speed::Measured(0.2), 0.5), 1.0);
    }

    #[test]
    fn test_recommendation_thresholds() {
        let scorer = SimilarityScorer::default();

        assert_eq!(scorer.recommend(0.95), Recommendation::Accept);
        assert_eq!(scorer.recommend(0.80), Recommendation::Accept);
        assert_eq!(scorer.recommend(0.65), Recommendation::Review);
        assert_eq!(scorer.recommend(0.50), Recommendation::Reject);
        assert_eq!(scorer.recommend(0.10), Recommendation::Reject);
    }

    #[test]
    fn test_recommendation_is_monotonic() {
        let scorer = SimilarityScorer::default();
        let rank = |r: Recommendation| match r {
            Recommendation::Reject => 0,
            Recommendation::Review => 1,
            Recommendation::Accept => 2,
        };

        let mut previous = rank(scorer.recommend(0.0));
        for step in 1..=100 {
            let current = rank(scorer.recommend(step as f64 / 100.0));
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_relative_difference() {
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
        assert_eq!(relative_difference(2.0, 4.0), 0.5);
        assert_eq!(relative_difference(4.0, 2.0), 0.5);
    }
}
