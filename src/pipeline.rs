//! Pipeline orchestration
//!
//! This module provides the public API for strokeprint.
//! It orchestrates the full pipeline from raw capture JSON to a decision:
//! capture adaptation → validation → feature extraction → baseline comparison
//! → (optional model blend) → audit encoding.

use crate::baseline::{Baseline, BaselineRegistry, ConsistencyReport};
use crate::config::EngineConfig;
use crate::encoder::AuditEncoder;
use crate::enrollment::EnrollmentStore;
use crate::error::ComputeError;
use crate::features::FeatureExtractor;
use crate::ml::{blend, difference_vector, FeatureVector, MlComparator};
use crate::schema::RawCaptureAdapter;
use crate::scorer::SimilarityScorer;
use crate::types::{AuditRecord, BiometricFeatureSet, BiometricType, ComparisonResult, ReasonCode};
use chrono::Utc;
use log::{debug, info, warn};

/// Extract a feature set from raw capture JSON (stateless, one-shot).
///
/// # Arguments
/// * `capture_json` - Raw capture JSON (`{"strokes": [...]}`, `{"raw": [...]}`,
///   `{"data": [...]}`, or a bare array of strokes)
///
/// # Returns
/// Feature set JSON
///
/// # Example
/// ```ignore
/// let features_json = extract_json(capture_json)?;
/// ```
pub fn extract_json(capture_json: String) -> Result<String, ComputeError> {
    let features = FeatureExtractor::default().extract(&RawCaptureAdapter::from_json(&capture_json)?);
    serde_json::to_string_pretty(&features).map_err(ComputeError::JsonError)
}

/// Compare two stored feature sets (stateless, one-shot).
///
/// # Returns
/// Comparison result JSON
pub fn compare_json(reference_json: String, candidate_json: String) -> Result<String, ComputeError> {
    let reference: BiometricFeatureSet = serde_json::from_str(&reference_json)?;
    let candidate: BiometricFeatureSet = serde_json::from_str(&candidate_json)?;
    let result = SimilarityScorer::default().compare(&reference, &candidate);
    serde_json::to_string_pretty(&result).map_err(ComputeError::JsonError)
}

/// Extract and compare two raw captures (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let result_json = verify_json(enrolled_capture, attempt_capture)?;
/// ```
pub fn verify_json(reference_capture: String, candidate_capture: String) -> Result<String, ComputeError> {
    let extractor = FeatureExtractor::default();
    let reference = extractor.extract(&RawCaptureAdapter::from_json(&reference_capture)?);
    let candidate = extractor.extract(&RawCaptureAdapter::from_json(&candidate_capture)?);
    let result = SimilarityScorer::default().compare(&reference, &candidate);
    serde_json::to_string_pretty(&result).map_err(ComputeError::JsonError)
}

/// Stateful processor holding enrolled baselines and pending enrollments.
///
/// Use this when baselines must persist across authentication attempts.
pub struct AuthProcessor {
    extractor: FeatureExtractor,
    scorer: SimilarityScorer,
    registry: BaselineRegistry,
    enrollments: EnrollmentStore,
    encoder: AuditEncoder,
    comparator: Option<(Box<dyn MlComparator>, f64)>,
}

impl Default for AuthProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            extractor: FeatureExtractor::new(config.extractor),
            scorer: SimilarityScorer::new(config.scorer),
            registry: BaselineRegistry::new(),
            enrollments: EnrollmentStore::default(),
            encoder: AuditEncoder::new(),
            comparator: None,
        }
    }

    /// Create a processor with a checked configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.extractor),
            scorer: SimilarityScorer::new(config.scorer),
            ..Self::new()
        })
    }

    /// Attach an external classifier whose prediction is blended in with `weight` (0-1)
    pub fn with_comparator(mut self, comparator: Box<dyn MlComparator>, weight: f64) -> Self {
        self.comparator = Some((comparator, weight));
        self
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Parse, validate, and extract one capture
    pub fn extract(&self, capture_json: &str) -> Result<BiometricFeatureSet, ComputeError> {
        let collection = RawCaptureAdapter::from_json(capture_json)?;
        debug!(
            "extracting features from {} strokes / {} points",
            collection.stroke_count(),
            collection.total_points()
        );
        Ok(self.extractor.extract(&collection))
    }

    /// Enroll a new baseline version from one or more captures
    pub fn enroll(
        &mut self,
        user_id: &str,
        biometric_type: BiometricType,
        captures: &[&str],
    ) -> Result<Baseline, ComputeError> {
        let samples = captures
            .iter()
            .map(|capture| self.extract(capture))
            .collect::<Result<Vec<_>, _>>()?;
        self.store_baseline(user_id, biometric_type, samples)
    }

    /// Open a multi-step enrollment session
    pub fn begin_enrollment(&mut self, user_id: &str, biometric_type: BiometricType) -> String {
        let session_id = self.enrollments.begin(user_id, biometric_type, Utc::now());
        debug!("enrollment session {session_id} opened for {user_id} ({biometric_type})");
        session_id
    }

    /// Add one capture to an open session and return the session's sample count
    pub fn add_enrollment_sample(
        &mut self,
        session_id: &str,
        capture_json: &str,
    ) -> Result<usize, ComputeError> {
        let features = self.extract(capture_json)?;
        self.enrollments.add_sample(session_id, features, Utc::now())
    }

    /// Close a session and store its samples as a new baseline version
    pub fn finish_enrollment(&mut self, session_id: &str) -> Result<Baseline, ComputeError> {
        let session = self.enrollments.take(session_id, Utc::now())?;
        self.store_baseline(&session.user_id, session.biometric_type, session.samples)
    }

    /// Drop expired enrollment sessions
    pub fn purge_expired_enrollments(&mut self) -> usize {
        let purged = self.enrollments.purge_expired(Utc::now());
        if purged > 0 {
            debug!("purged {purged} expired enrollment sessions");
        }
        purged
    }

    /// Score an attempt against the user's latest baseline.
    ///
    /// Attempts that cannot be scored (no baseline, malformed capture) come
    /// back as a reject record with a reason code; only encoding failures
    /// surface as errors.
    pub fn authenticate(
        &self,
        user_id: &str,
        biometric_type: BiometricType,
        capture_json: &str,
    ) -> Result<AuditRecord, ComputeError> {
        let Some(baseline) = self.registry.latest(user_id, biometric_type) else {
            warn!("no {biometric_type} baseline for {user_id}");
            let result = ComparisonResult::rejected(ReasonCode::NoBaseline);
            return self.encoder.encode(user_id, biometric_type, None, &result);
        };

        let result = match self.extract(capture_json) {
            Ok(candidate) => self.score(baseline, &candidate),
            Err(e) => {
                warn!("rejecting capture for {user_id}: {e}");
                ComparisonResult::rejected(ReasonCode::InvalidCapture)
            }
        };

        info!(
            "{user_id} ({biometric_type}) against baseline v{}: {:?} (score {:.3}, confidence {:.3})",
            baseline.version, result.recommendation, result.score, result.confidence
        );
        self.encoder
            .encode(user_id, biometric_type, Some(baseline), &result)
    }

    /// Authenticate and encode the audit record as JSON
    pub fn authenticate_json(
        &self,
        user_id: &str,
        biometric_type: BiometricType,
        capture_json: &str,
    ) -> Result<String, ComputeError> {
        let record = self.authenticate(user_id, biometric_type, capture_json)?;
        serde_json::to_string_pretty(&record).map_err(ComputeError::JsonError)
    }

    /// Consistency of the latest baseline's samples
    pub fn consistency(
        &self,
        user_id: &str,
        biometric_type: BiometricType,
    ) -> Option<ConsistencyReport> {
        self.registry
            .latest(user_id, biometric_type)
            .and_then(Baseline::consistency)
    }

    /// Load baseline state from JSON
    pub fn load_baselines(&mut self, json: &str) -> Result<(), ComputeError> {
        self.registry = BaselineRegistry::from_json(json)?;
        Ok(())
    }

    /// Save baseline state to JSON
    pub fn save_baselines(&self) -> Result<String, ComputeError> {
        self.registry
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Number of enrolled (user, type) pairs
    pub fn baseline_count(&self) -> usize {
        self.registry.len()
    }

    pub fn clear_baselines(&mut self) {
        self.registry.clear();
    }

    fn store_baseline(
        &mut self,
        user_id: &str,
        biometric_type: BiometricType,
        samples: Vec<BiometricFeatureSet>,
    ) -> Result<Baseline, ComputeError> {
        let baseline = self
            .registry
            .enroll(user_id, biometric_type, samples, Utc::now())?
            .clone();
        info!(
            "enrolled {user_id} ({biometric_type}) baseline v{} with {} samples",
            baseline.version,
            baseline.samples.len()
        );
        Ok(baseline)
    }

    fn score(&self, baseline: &Baseline, candidate: &BiometricFeatureSet) -> ComparisonResult {
        let (index, result) = baseline.best_match(&self.scorer, candidate);

        let Some((comparator, weight)) = &self.comparator else {
            return result;
        };
        let Some(sample) = baseline.samples.get(index) else {
            return result;
        };

        let difference = difference_vector(
            &FeatureVector::from_feature_set(candidate),
            &FeatureVector::from_feature_set(sample),
        );
        match comparator.predict(&difference) {
            Ok(prediction) => {
                debug!(
                    "model genuine probability {:.3}",
                    prediction.genuine_probability()
                );
                blend(&self.scorer, &result, prediction, *weight)
            }
            Err(e) => {
                warn!("external comparator failed, using engine score: {e}");
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::MlPrediction;
    use crate::types::Recommendation;

    fn capture(scale: f64, pressure: f64) -> String {
        let stroke = |offset: f64, start: f64| {
            let points: Vec<String> = (0..24)
                .map(|i| {
                    let f = i as f64;
                    format!(
                        r#"{{"x": {}, "y": {}, "pressure": {}, "timestamp": {}}}"#,
                        offset + f * 4.0 * scale,
                        (f * 0.5).sin() * 12.0 * scale,
                        pressure + 0.15 * (f * 0.9).sin(),
                        start + f * 14.0
                    )
                })
                .collect();
            format!("[{}]", points.join(","))
        };
        format!(
            r#"{{"strokes": [{}, {}], "type": "signature"}}"#,
            stroke(0.0, 0.0),
            stroke(120.0, 900.0)
        )
    }

    struct FixedComparator(f64);

    impl MlComparator for FixedComparator {
        fn predict(&self, _difference: &FeatureVector) -> Result<MlPrediction, ComputeError> {
            Ok(MlPrediction::new(self.0))
        }
    }

    struct FailingComparator;

    impl MlComparator for FailingComparator {
        fn predict(&self, _difference: &FeatureVector) -> Result<MlPrediction, ComputeError> {
            Err(ComputeError::ExternalComparator("model offline".to_string()))
        }
    }

    #[test]
    fn test_extract_json() {
        let json = extract_json(capture(1.0, 0.5)).unwrap();
        let features: BiometricFeatureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(features.basic.stroke_count, 2);
        assert_eq!(features.basic.total_points, 48);
        assert_eq!(features.biometric_type, Some(BiometricType::Signature));
    }

    #[test]
    fn test_extract_json_rejects_non_finite() {
        let bad = r#"{"strokes": [[{"x": 1.0, "y": 1e999, "timestamp": 0}]]}"#;
        assert!(extract_json(bad.to_string()).is_err());
    }

    #[test]
    fn test_verify_json_identical_captures() {
        let result_json = verify_json(capture(1.0, 0.5), capture(1.0, 0.5)).unwrap();
        let result: ComparisonResult = serde_json::from_str(&result_json).unwrap();
        assert_eq!(result.recommendation, Recommendation::Accept);
    }

    #[test]
    fn test_compare_json() {
        let a = extract_json(capture(1.0, 0.5)).unwrap();
        let b = extract_json(capture(2.5, 0.2)).unwrap();
        let result: ComparisonResult =
            serde_json::from_str(&compare_json(a, b).unwrap()).unwrap();
        assert!(result.score < 1.0);
        assert!(result.match_details.pressure < 1.0);
        assert!(result.match_details.geometry < 1.0);
    }

    #[test]
    fn test_enroll_and_authenticate() {
        let mut processor = AuthProcessor::new();
        let genuine = capture(1.0, 0.5);
        let baseline = processor
            .enroll("alice", BiometricType::Signature, &[&genuine, &capture(1.05, 0.5)])
            .unwrap();
        assert_eq!(baseline.version, 1);
        assert_eq!(processor.baseline_count(), 1);

        let record = processor
            .authenticate("alice", BiometricType::Signature, &genuine)
            .unwrap();
        assert_eq!(record.result.recommendation, Recommendation::Accept);
        assert_eq!(record.result.score, 1.0);
        assert_eq!(record.baseline.map(|b| b.version), Some(1));
    }

    #[test]
    fn test_authenticate_without_baseline() {
        let processor = AuthProcessor::new();
        let record = processor
            .authenticate("nobody", BiometricType::Shape, &capture(1.0, 0.5))
            .unwrap();
        assert_eq!(record.result.recommendation, Recommendation::Reject);
        assert_eq!(record.result.reasons, vec![ReasonCode::NoBaseline]);
        assert!(record.baseline.is_none());
    }

    #[test]
    fn test_authenticate_invalid_capture() {
        let mut processor = AuthProcessor::new();
        processor
            .enroll("alice", BiometricType::Signature, &[&capture(1.0, 0.5)])
            .unwrap();

        let record = processor
            .authenticate("alice", BiometricType::Signature, "{not json")
            .unwrap();
        assert_eq!(record.result.recommendation, Recommendation::Reject);
        assert_eq!(record.result.reasons, vec![ReasonCode::InvalidCapture]);
    }

    #[test]
    fn test_session_enrollment() {
        let mut processor = AuthProcessor::new();
        let session = processor.begin_enrollment("bob", BiometricType::Drawing);

        assert_eq!(processor.add_enrollment_sample(&session, &capture(1.0, 0.5)).unwrap(), 1);
        assert_eq!(processor.add_enrollment_sample(&session, &capture(1.1, 0.5)).unwrap(), 2);

        let baseline = processor.finish_enrollment(&session).unwrap();
        assert_eq!(baseline.samples.len(), 2);
        assert!(processor.consistency("bob", BiometricType::Drawing).is_some());
        assert!(processor.finish_enrollment(&session).is_err());
    }

    #[test]
    fn test_reenrollment_creates_new_version() {
        let mut processor = AuthProcessor::new();
        processor
            .enroll("alice", BiometricType::Signature, &[&capture(1.0, 0.5)])
            .unwrap();
        let second = processor
            .enroll("alice", BiometricType::Signature, &[&capture(1.2, 0.4)])
            .unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(processor.baseline_count(), 1);
    }

    #[test]
    fn test_save_and_load_baselines() {
        let mut processor = AuthProcessor::new();
        processor
            .enroll("alice", BiometricType::Signature, &[&capture(1.0, 0.5)])
            .unwrap();
        let saved = processor.save_baselines().unwrap();

        let mut restored = AuthProcessor::new();
        restored.load_baselines(&saved).unwrap();
        assert_eq!(restored.baseline_count(), 1);

        restored.clear_baselines();
        assert_eq!(restored.baseline_count(), 0);
        let err = restored.load_baselines("garbage").unwrap_err();
        assert!(matches!(err, ComputeError::JsonError(_)));
        assert!(!err.to_string().contains("capture"));
    }

    #[test]
    fn test_reloaded_baseline_still_matches_exactly() {
        let genuine = capture(1.3, 0.45);
        let mut processor = AuthProcessor::new();
        processor
            .enroll("alice", BiometricType::Signature, &[&genuine])
            .unwrap();

        let mut restored = AuthProcessor::new();
        restored.load_baselines(&processor.save_baselines().unwrap()).unwrap();

        let record = restored
            .authenticate("alice", BiometricType::Signature, &genuine)
            .unwrap();
        assert_eq!(record.result.score, 1.0);
        assert_eq!(record.result.recommendation, Recommendation::Accept);
    }

    #[test]
    fn test_extreme_coordinates_survive_persistence() {
        let extreme = r#"{"strokes": [[
            {"x": 0, "y": 0, "pressure": 0.5, "timestamp": 0},
            {"x": 1e308, "y": 0, "pressure": 0.5, "timestamp": 10},
            {"x": 0, "y": 0, "pressure": 0.5, "timestamp": 20}
        ]]}"#;
        let mut processor = AuthProcessor::new();
        processor
            .enroll("alice", BiometricType::Shape, &[extreme])
            .unwrap();

        let mut restored = AuthProcessor::new();
        restored.load_baselines(&processor.save_baselines().unwrap()).unwrap();
        assert_eq!(restored.baseline_count(), 1);
    }

    #[test]
    fn test_comparator_blend_and_fallback() {
        let genuine = capture(1.0, 0.5);

        let mut doubtful = AuthProcessor::new().with_comparator(Box::new(FixedComparator(0.0)), 0.5);
        doubtful
            .enroll("alice", BiometricType::Signature, &[&genuine])
            .unwrap();
        let record = doubtful
            .authenticate("alice", BiometricType::Signature, &genuine)
            .unwrap();
        assert_eq!(record.result.score, 0.5);
        assert_eq!(record.result.recommendation, Recommendation::Reject);
        assert!(record.result.reasons.contains(&ReasonCode::MlDisagreement));

        let mut offline = AuthProcessor::new().with_comparator(Box::new(FailingComparator), 0.5);
        offline
            .enroll("alice", BiometricType::Signature, &[&genuine])
            .unwrap();
        let record = offline
            .authenticate("alice", BiometricType::Signature, &genuine)
            .unwrap();
        assert_eq!(record.result.score, 1.0);
        assert_eq!(record.result.recommendation, Recommendation::Accept);
    }

    #[test]
    fn test_with_config_validates() {
        let mut config = EngineConfig::default();
        config.scorer.accept_threshold = 0.3;
        assert!(AuthProcessor::with_config(config).is_err());
        assert!(AuthProcessor::with_config(EngineConfig::default()).is_ok());
    }
}
