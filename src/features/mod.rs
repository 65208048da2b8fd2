//! Feature extraction
//!
//! Turns one `StrokeCollection` into a `BiometricFeatureSet`. Extraction is
//! deterministic and total: empty collections, single points, and coincident
//! timestamps all produce finite, documented defaults.

pub(crate) mod geometry;
pub(crate) mod pressure;
pub(crate) mod security;
pub mod stats;
pub(crate) mod timing;

use crate::config::ExtractorConfig;
use crate::features::stats::finite_or_zero;
use crate::types::{BasicCounts, BiometricFeatureSet, StrokeCollection};

/// Feature extractor for stroke collections
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Derive the full feature set
    pub fn extract(&self, collection: &StrokeCollection) -> BiometricFeatureSet {
        let basic = compute_basic_counts(collection);
        let pressure = pressure::derive(collection);
        let geometry = geometry::derive(collection);
        let timing = timing::derive(collection, geometry.total_path_length);
        let security = security::derive(&self.config, collection, &pressure, &timing);

        BiometricFeatureSet {
            biometric_type: collection.biometric_type,
            basic,
            pressure,
            timing,
            geometry,
            security,
        }
    }
}

/// Extract with the default configuration
pub fn extract(collection: &StrokeCollection) -> BiometricFeatureSet {
    FeatureExtractor::default().extract(collection)
}

fn compute_basic_counts(collection: &StrokeCollection) -> BasicCounts {
    let stroke_count = collection.stroke_count();
    let total_points = collection.total_points();
    let average_points_per_stroke = if stroke_count == 0 {
        0.0
    } else {
        finite_or_zero(total_points as f64 / stroke_count as f64)
    };

    BasicCounts {
        stroke_count: u32::try_from(stroke_count).unwrap_or(u32::MAX),
        total_points: u32::try_from(total_points).unwrap_or(u32::MAX),
        average_points_per_stroke,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BiometricType, DeviceType, Point, Speed, Stroke};

    fn stroke(points: &[(f64, f64, f64, f64)]) -> Stroke {
        Stroke::new(
            points
                .iter()
                .map(|&(x, y, p, t)| Point::new(x, y, p, t))
                .collect(),
            DeviceType::Pen,
        )
    }

    fn all_finite(set: &BiometricFeatureSet) -> bool {
        let json = serde_json::to_value(set).unwrap();
        fn walk(v: &serde_json::Value) -> bool {
            match v {
                serde_json::Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
                serde_json::Value::Array(items) => items.iter().all(walk),
                serde_json::Value::Object(map) => map.values().all(walk),
                serde_json::Value::Null => false,
                _ => true,
            }
        }
        walk(&json)
    }

    #[test]
    fn test_extract_scenario_one() {
        let collection = StrokeCollection::new(vec![stroke(&[
            (0.0, 0.0, 0.5, 0.0),
            (3.0, 4.0, 0.5, 100.0),
            (3.0, 4.0, 0.5, 200.0),
        ])]);
        let features = extract(&collection);

        assert_eq!(features.geometry.total_path_length, 5.0);
        assert_eq!(features.timing.total_duration, 200.0);
        assert_eq!(features.basic.stroke_count, 1);
        assert_eq!(features.basic.total_points, 3);
        assert_eq!(features.basic.average_points_per_stroke, 3.0);
    }

    #[test]
    fn test_extract_empty_collection() {
        let features = extract(&StrokeCollection::default());

        assert_eq!(features.basic.stroke_count, 0);
        assert_eq!(features.basic.total_points, 0);
        assert_eq!(features.timing.total_duration, 0.0);
        assert_eq!(features.pressure.mean, 0.5);
        assert!(features.is_empty());
        assert!(all_finite(&features));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let collection = StrokeCollection::new(vec![
            stroke(&[(0.0, 0.0, 0.2, 0.0), (5.0, 1.0, 0.6, 12.0), (9.0, 7.0, 0.4, 30.0)]),
            stroke(&[(20.0, 3.0, 0.7, 90.0), (25.0, 9.0, 0.3, 105.0)]),
        ])
        .with_biometric_type(BiometricType::Signature);

        let first = extract(&collection);
        let second = extract(&collection);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.biometric_type, Some(BiometricType::Signature));
    }

    #[test]
    fn test_pathological_inputs_stay_finite() {
        let cases = vec![
            StrokeCollection::new(vec![stroke(&[(1.0, 1.0, 0.5, 0.0)])]),
            StrokeCollection::new(vec![stroke(&[
                (0.0, 0.0, 0.0, 50.0),
                (10.0, 0.0, 0.0, 50.0),
                (10.0, 10.0, 0.0, 50.0),
            ])]),
            StrokeCollection::new(vec![
                Stroke::new(Vec::new(), DeviceType::Mouse),
                stroke(&[(0.0, 0.0, 0.0, 0.0), (0.0, 0.0, 0.0, 0.0)]),
            ]),
        ];

        for collection in &cases {
            assert!(all_finite(&extract(collection)), "non-finite output for {collection:?}");
        }
    }

    #[test]
    fn test_coordinates_near_f64_max_stay_finite() {
        let collection = StrokeCollection::new(vec![stroke(&[
            (0.0, 0.0, 0.5, 0.0),
            (1e308, 0.0, 0.5, 10.0),
            (0.0, 0.0, 0.5, 20.0),
        ])]);
        assert!(crate::validator::is_valid(&collection));

        let features = extract(&collection);
        assert!(all_finite(&features));
        assert!((0.0..=1.0).contains(&features.timing.consistency_score));
        assert!((0.0..=1.0).contains(&features.security.velocity_consistency));

        let json = serde_json::to_string(&features).unwrap();
        let restored: BiometricFeatureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, features);
    }

    #[test]
    fn test_coincident_timestamps_are_unbounded() {
        let collection = StrokeCollection::new(vec![stroke(&[
            (0.0, 0.0, 0.5, 50.0),
            (10.0, 0.0, 0.5, 50.0),
        ])]);
        let features = extract(&collection);
        assert_eq!(features.timing.average_speed, Speed::Unbounded);
        assert!(all_finite(&features));
    }
}
