//! Baseline management
//!
//! A baseline is the enrolled reference for one user and one biometric type.
//! Baselines are immutable: re-enrollment stores a new version next to the
//! old ones, and authentication reads the latest.

use crate::error::ComputeError;
use crate::features::stats::{coefficient_of_variation, finite_or_zero};
use crate::scorer::SimilarityScorer;
use crate::types::{BiometricFeatureSet, BiometricType, ComparisonResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Minimum number of samples for a consistency report
pub const MIN_CONSISTENCY_SAMPLES: usize = 2;

/// One enrolled baseline version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub id: Uuid,
    pub user_id: String,
    pub biometric_type: BiometricType,
    /// Starts at 1, incremented on every re-enrollment
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// Enrollment samples (at least one)
    pub samples: Vec<BiometricFeatureSet>,
}

impl Baseline {
    /// Create a baseline, rejecting empty sample lists and samples without points
    pub fn new(
        user_id: &str,
        biometric_type: BiometricType,
        version: u32,
        samples: Vec<BiometricFeatureSet>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ComputeError> {
        if samples.is_empty() {
            return Err(ComputeError::InvalidCapture(
                "baseline requires at least one enrollment sample".to_string(),
            ));
        }
        if let Some(index) = samples.iter().position(BiometricFeatureSet::is_empty) {
            return Err(ComputeError::InvalidCapture(format!(
                "enrollment sample {index} contains no points"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            biometric_type,
            version,
            created_at,
            samples,
        })
    }

    /// Compare a candidate against every sample and keep the best match.
    ///
    /// Ties keep the earliest sample.
    pub fn compare(
        &self,
        scorer: &SimilarityScorer,
        candidate: &BiometricFeatureSet,
    ) -> ComparisonResult {
        self.best_match(scorer, candidate).1
    }

    /// Index of the best-matching sample together with its result
    pub fn best_match(
        &self,
        scorer: &SimilarityScorer,
        candidate: &BiometricFeatureSet,
    ) -> (usize, ComparisonResult) {
        let mut best: Option<(usize, ComparisonResult)> = None;
        for (index, sample) in self.samples.iter().enumerate() {
            let result = scorer.compare(sample, candidate);
            if best.as_ref().map_or(true, |(_, b)| result.score > b.score) {
                best = Some((index, result));
            }
        }
        best.unwrap_or_else(|| (0, scorer.compare(&BiometricFeatureSet::default(), candidate)))
    }

    /// How consistently the user reproduced the capture across samples
    pub fn consistency(&self) -> Option<ConsistencyReport> {
        ConsistencyReport::from_samples(&self.samples)
    }
}

/// Spread of key features across enrollment samples.
///
/// Each score is `1 - σ / μ` clamped to 0-1 (1 when μ is 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub velocity_consistency: f64,
    pub stroke_count_consistency: f64,
    pub area_consistency: f64,
    /// Mean of the three scores
    pub overall: f64,
    pub sample_count: usize,
}

impl ConsistencyReport {
    /// `None` with fewer than two samples
    pub fn from_samples(samples: &[BiometricFeatureSet]) -> Option<Self> {
        if samples.len() < MIN_CONSISTENCY_SAMPLES {
            return None;
        }

        let velocities: Vec<f64> = samples.iter().map(|s| s.timing.mean_segment_speed).collect();
        let stroke_counts: Vec<f64> = samples.iter().map(|s| s.basic.stroke_count as f64).collect();
        let areas: Vec<f64> = samples.iter().map(|s| s.geometry.area).collect();

        let velocity_consistency = compute_spread_consistency(&velocities);
        let stroke_count_consistency = compute_spread_consistency(&stroke_counts);
        let area_consistency = compute_spread_consistency(&areas);

        Some(Self {
            velocity_consistency,
            stroke_count_consistency,
            area_consistency,
            overall: (velocity_consistency + stroke_count_consistency + area_consistency) / 3.0,
            sample_count: samples.len(),
        })
    }
}

fn compute_spread_consistency(values: &[f64]) -> f64 {
    match coefficient_of_variation(values) {
        Some(cv) => finite_or_zero(1.0 - cv).clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// All baseline versions, keyed by user and biometric type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineRegistry {
    baselines: BTreeMap<String, Vec<Baseline>>,
}

impl BaselineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new baseline version for the user and return it
    pub fn enroll(
        &mut self,
        user_id: &str,
        biometric_type: BiometricType,
        samples: Vec<BiometricFeatureSet>,
        now: DateTime<Utc>,
    ) -> Result<&Baseline, ComputeError> {
        let version = self
            .latest(user_id, biometric_type)
            .map_or(1, |b| b.version + 1);
        let baseline = Baseline::new(user_id, biometric_type, version, samples, now)?;

        let versions = self
            .baselines
            .entry(registry_key(user_id, biometric_type))
            .or_default();
        let index = versions.len();
        versions.push(baseline);
        Ok(&versions[index])
    }

    /// Latest baseline version, if the user has enrolled this type
    pub fn latest(&self, user_id: &str, biometric_type: BiometricType) -> Option<&Baseline> {
        self.baselines
            .get(&registry_key(user_id, biometric_type))
            .and_then(|versions| versions.last())
    }

    /// All versions, oldest first
    pub fn versions(&self, user_id: &str, biometric_type: BiometricType) -> &[Baseline] {
        self.baselines
            .get(&registry_key(user_id, biometric_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of enrolled (user, type) pairs
    pub fn len(&self) -> usize {
        self.baselines.values().filter(|v| !v.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.baselines.clear();
    }

    /// Load registry from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize registry to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn registry_key(user_id: &str, biometric_type: BiometricType) -> String {
    format!("{user_id}:{}", biometric_type.as_str())
}
