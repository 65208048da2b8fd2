//! Engine configuration
//!
//! Every threshold, tolerance, and weight the extractor and scorer use lives
//! here with its default. Configs load from JSON; any omitted field keeps its
//! default.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Top-level configuration for extraction and scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extractor: ExtractorConfig,
    pub scorer: ScorerConfig,
}

impl EngineConfig {
    /// Load a configuration from JSON and check it
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        self.extractor.validate()?;
        self.scorer.validate()
    }
}

/// Thresholds for security indicators and risk tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Pressure variance below this emits `low_pressure_variance`
    pub low_pressure_variance: f64,
    /// Average speed (px/ms) above this emits `excessive_speed`
    pub excessive_speed: f64,
    /// Fewer total points than this emits `few_points`
    pub min_points: u32,
    /// Velocity consistency above this emits `robotic_velocity`
    pub robotic_velocity_consistency: f64,
    /// Velocity consistency below this emits `erratic_velocity`
    pub erratic_velocity_consistency: f64,
    /// Minimum timed segments before velocity tags are considered
    pub min_velocity_segments: u32,
    /// Speed (px/ms) at which the speed anomaly term reaches ~63%
    pub speed_saturation: f64,
    /// Pressure variance scale for the flat-pressure anomaly term
    pub pressure_variance_scale: f64,
    /// Points needed for full evidence in `confidence_level`
    pub confidence_points: u32,
    /// Duration (ms) needed for full evidence in `confidence_level`
    pub confidence_duration_ms: f64,
    /// Authenticity penalty per emitted risk tag
    pub risk_penalty: f64,
    pub anomaly_weights: AnomalyWeights,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            low_pressure_variance: 0.0005,
            excessive_speed: 5.0,
            min_points: 10,
            robotic_velocity_consistency: 0.97,
            erratic_velocity_consistency: 0.35,
            min_velocity_segments: 5,
            speed_saturation: 5.0,
            pressure_variance_scale: 0.002,
            confidence_points: 30,
            confidence_duration_ms: 500.0,
            risk_penalty: 0.1,
            anomaly_weights: AnomalyWeights::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), ComputeError> {
        check_positive("extractor.excessive_speed", self.excessive_speed)?;
        check_positive("extractor.speed_saturation", self.speed_saturation)?;
        check_positive(
            "extractor.pressure_variance_scale",
            self.pressure_variance_scale,
        )?;
        check_positive(
            "extractor.confidence_duration_ms",
            self.confidence_duration_ms,
        )?;
        check_unit("extractor.risk_penalty", self.risk_penalty)?;
        check_unit(
            "extractor.robotic_velocity_consistency",
            self.robotic_velocity_consistency,
        )?;
        check_unit(
            "extractor.erratic_velocity_consistency",
            self.erratic_velocity_consistency,
        )?;
        if self.low_pressure_variance < 0.0 || !self.low_pressure_variance.is_finite() {
            return Err(ComputeError::ConfigError(
                "extractor.low_pressure_variance must be a non-negative number".to_string(),
            ));
        }
        if self.confidence_points == 0 {
            return Err(ComputeError::ConfigError(
                "extractor.confidence_points must be at least 1".to_string(),
            ));
        }
        check_weights(
            "extractor.anomaly_weights",
            &[
                self.anomaly_weights.flat_pressure,
                self.anomaly_weights.speed,
                self.anomaly_weights.erratic_velocity,
                self.anomaly_weights.sparsity,
            ],
        )
    }
}

/// Weights of the anomaly composite (sum to 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyWeights {
    pub flat_pressure: f64,
    pub speed: f64,
    pub erratic_velocity: f64,
    pub sparsity: f64,
}

impl Default for AnomalyWeights {
    fn default() -> Self {
        Self {
            flat_pressure: 0.30,
            speed: 0.25,
            erratic_velocity: 0.25,
            sparsity: 0.20,
        }
    }
}

/// Similarity scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub weights: Weights,
    pub tolerances: Tolerances,
    /// `score >= accept_threshold` accepts
    pub accept_threshold: f64,
    /// `score <= reject_threshold` rejects
    pub reject_threshold: f64,
    /// Sub-scores below this are reported as mismatches
    pub mismatch_threshold: f64,
    /// Confidence below this adds `low_confidence`
    pub low_confidence_threshold: f64,
    /// Points per side needed for full confidence
    pub confidence_points: u32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            tolerances: Tolerances::default(),
            accept_threshold: 0.80,
            reject_threshold: 0.50,
            mismatch_threshold: 0.60,
            low_confidence_threshold: 0.50,
            confidence_points: 30,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), ComputeError> {
        check_weights(
            "scorer.weights",
            &[
                self.weights.pressure,
                self.weights.timing,
                self.weights.geometry,
                self.weights.security,
            ],
        )?;
        check_unit("scorer.accept_threshold", self.accept_threshold)?;
        check_unit("scorer.reject_threshold", self.reject_threshold)?;
        check_unit("scorer.mismatch_threshold", self.mismatch_threshold)?;
        check_unit(
            "scorer.low_confidence_threshold",
            self.low_confidence_threshold,
        )?;
        if self.reject_threshold >= self.accept_threshold {
            return Err(ComputeError::ConfigError(format!(
                "scorer.reject_threshold ({}) must be below scorer.accept_threshold ({})",
                self.reject_threshold, self.accept_threshold
            )));
        }
        if self.confidence_points == 0 {
            return Err(ComputeError::ConfigError(
                "scorer.confidence_points must be at least 1".to_string(),
            ));
        }
        self.tolerances.validate()
    }
}

/// Weights of the linear score combination (sum to 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub pressure: f64,
    pub timing: f64,
    pub geometry: f64,
    pub security: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            pressure: 0.25,
            timing: 0.25,
            geometry: 0.35,
            security: 0.15,
        }
    }
}

/// Distance at which each feature dimension's similarity reaches 0.
///
/// Fields suffixed `_rel` are compared as relative differences
/// (`|a - b| / max(|a|, |b|)`); the rest as absolute differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    pub pressure_mean: f64,
    pub pressure_variance: f64,
    pub pressure_range: f64,
    pub pressure_extrema_rel: f64,
    pub duration_rel: f64,
    pub speed_rel: f64,
    pub rhythm: f64,
    pub speed_consistency: f64,
    pub stroke_count: f64,
    pub aspect_ratio_rel: f64,
    pub path_length_rel: f64,
    /// Centroid offset as a fraction of the larger bounding-box diagonal
    pub centroid: f64,
    pub symmetry: f64,
    /// Mean absolute turn angle (radians)
    pub turning: f64,
    pub anomaly: f64,
    pub authenticity: f64,
    pub velocity_consistency: f64,
    pub pressure_consistency: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            pressure_mean: 0.2,
            pressure_variance: 0.02,
            pressure_range: 0.3,
            pressure_extrema_rel: 0.6,
            duration_rel: 0.5,
            speed_rel: 0.5,
            rhythm: 0.3,
            speed_consistency: 0.3,
            stroke_count: 3.0,
            aspect_ratio_rel: 0.5,
            path_length_rel: 0.4,
            centroid: 0.25,
            symmetry: 0.3,
            turning: 0.5,
            anomaly: 0.3,
            authenticity: 0.3,
            velocity_consistency: 0.3,
            pressure_consistency: 0.3,
        }
    }
}

impl Tolerances {
    fn validate(&self) -> Result<(), ComputeError> {
        let named = [
            ("pressure_mean", self.pressure_mean),
            ("pressure_variance", self.pressure_variance),
            ("pressure_range", self.pressure_range),
            ("pressure_extrema_rel", self.pressure_extrema_rel),
            ("duration_rel", self.duration_rel),
            ("speed_rel", self.speed_rel),
            ("rhythm", self.rhythm),
            ("speed_consistency", self.speed_consistency),
            ("stroke_count", self.stroke_count),
            ("aspect_ratio_rel", self.aspect_ratio_rel),
            ("path_length_rel", self.path_length_rel),
            ("centroid", self.centroid),
            ("symmetry", self.symmetry),
            ("turning", self.turning),
            ("anomaly", self.anomaly),
            ("authenticity", self.authenticity),
            ("velocity_consistency", self.velocity_consistency),
            ("pressure_consistency", self.pressure_consistency),
        ];
        for (name, value) in named {
            check_positive(&format!("scorer.tolerances.{name}"), value)?;
        }
        Ok(())
    }
}

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

fn check_weights(name: &str, weights: &[f64]) -> Result<(), ComputeError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ComputeError::ConfigError(format!(
            "{name} must all be non-negative numbers"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(ComputeError::ConfigError(format!(
            "{name} must sum to 1 (got {sum})"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), ComputeError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ComputeError::ConfigError(format!(
            "{name} must be a positive number (got {value})"
        )));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<(), ComputeError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ComputeError::ConfigError(format!(
            "{name} must be within [0, 1] (got {value})"
        )));
    }
    Ok(())
}
