//! Security and anomaly indicators
//!
//! Composites of the pressure and timing groups, each normalized to 0-1.
//! Every threshold comes from `ExtractorConfig`.

use crate::config::ExtractorConfig;
use crate::features::stats::{finite_or_zero, regularity, saturate};
use crate::features::timing::segment_speeds;
use crate::types::{
    PressureDynamics, RiskFactor, SecurityIndicators, Speed, StrokeCollection, TimingPatterns,
};

/// Derive security indicators
pub fn derive(
    config: &ExtractorConfig,
    collection: &StrokeCollection,
    pressure: &PressureDynamics,
    timing: &TimingPatterns,
) -> SecurityIndicators {
    let total_points = collection.total_points();
    if total_points == 0 {
        return SecurityIndicators {
            risk_factors: vec![RiskFactor::FewPoints],
            ..SecurityIndicators::default()
        };
    }

    let pressures: Vec<f64> = collection.points().map(|p| p.pressure).collect();
    let timed_segments = segment_speeds(collection).len();

    let risk_factors = risk_factors(config, total_points, timed_segments, pressure, timing);
    let anomaly_score = compute_anomaly_score(config, total_points, timed_segments, pressure, timing);
    let authenticity_score = compute_authenticity_score(config, anomaly_score, risk_factors.len());

    SecurityIndicators {
        anomaly_score,
        authenticity_score,
        confidence_level: compute_confidence_level(config, total_points, timing.total_duration),
        risk_factors,
        velocity_consistency: timing.consistency_score,
        pressure_consistency: regularity(&pressures),
    }
}

/// Weighted combination of four anomaly terms.
///
/// - flat pressure: `exp(-variance / pressure_variance_scale)`, 1 for a single sample
/// - speed: `1 - exp(-speed / speed_saturation)`, 1 when unbounded
/// - erratic velocity: `1 - velocity consistency`, 0 with no timed segments
/// - sparsity: `1 - min(1, points / min_points)`
pub fn compute_anomaly_score(
    config: &ExtractorConfig,
    total_points: usize,
    timed_segments: usize,
    pressure: &PressureDynamics,
    timing: &TimingPatterns,
) -> f64 {
    let weights = &config.anomaly_weights;

    let flat_pressure = if total_points < 2 {
        1.0
    } else {
        (-pressure.variance / config.pressure_variance_scale).exp()
    };

    let speed = match timing.average_speed {
        Speed::Unbounded => 1.0,
        Speed::Measured(v) => saturate(v, config.speed_saturation),
    };

    let erratic = if timed_segments == 0 {
        0.0
    } else {
        1.0 - timing.consistency_score
    };

    let sparsity = if config.min_points == 0 {
        0.0
    } else {
        1.0 - (total_points as f64 / config.min_points as f64).min(1.0)
    };

    let score = weights.flat_pressure * flat_pressure
        + weights.speed * speed
        + weights.erratic_velocity * erratic
        + weights.sparsity * sparsity;

    finite_or_zero(score).clamp(0.0, 1.0)
}

/// `(1 - anomaly) × (1 - risk_penalty × risk tag count)`, clamped to 0-1
pub fn compute_authenticity_score(config: &ExtractorConfig, anomaly: f64, risk_count: usize) -> f64 {
    let penalty = (1.0 - config.risk_penalty * risk_count as f64).max(0.0);
    finite_or_zero((1.0 - anomaly) * penalty).clamp(0.0, 1.0)
}

/// Evidence available in the capture: half from point count, half from duration
pub fn compute_confidence_level(config: &ExtractorConfig, total_points: usize, duration: f64) -> f64 {
    let points = (total_points as f64 / config.confidence_points.max(1) as f64).min(1.0);
    let time = if config.confidence_duration_ms > 0.0 {
        (duration / config.confidence_duration_ms).min(1.0)
    } else {
        0.0
    };
    finite_or_zero(0.5 * points + 0.5 * time).clamp(0.0, 1.0)
}

fn risk_factors(
    config: &ExtractorConfig,
    total_points: usize,
    timed_segments: usize,
    pressure: &PressureDynamics,
    timing: &TimingPatterns,
) -> Vec<RiskFactor> {
    let mut tags = Vec::new();

    if total_points >= 2 && pressure.variance < config.low_pressure_variance {
        tags.push(RiskFactor::LowPressureVariance);
    }

    match timing.average_speed {
        Speed::Unbounded => tags.push(RiskFactor::UnboundedSpeed),
        Speed::Measured(v) if v > config.excessive_speed => tags.push(RiskFactor::ExcessiveSpeed),
        Speed::Measured(_) => {}
    }

    if total_points < config.min_points as usize {
        tags.push(RiskFactor::FewPoints);
    }

    if timed_segments >= config.min_velocity_segments as usize {
        if timing.consistency_score > config.robotic_velocity_consistency {
            tags.push(RiskFactor::RoboticVelocity);
        } else if timing.consistency_score < config.erratic_velocity_consistency {
            tags.push(RiskFactor::ErraticVelocity);
        }
    }

    tags
}
