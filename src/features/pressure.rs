//! Pressure dynamics

use crate::features::stats::{finite_or_zero, mean, sanitize_all, variance};
use crate::types::{PressureDynamics, StrokeCollection, DEFAULT_PRESSURE};

/// Derive pressure dynamics from all points, strokes concatenated in order
pub fn derive(collection: &StrokeCollection) -> PressureDynamics {
    let pressures: Vec<f64> = collection.points().map(|p| p.pressure).collect();

    if pressures.is_empty() {
        return PressureDynamics {
            mean: DEFAULT_PRESSURE,
            ..PressureDynamics::default()
        };
    }

    let min = pressures.iter().copied().fold(f64::INFINITY, f64::min);
    let max = pressures.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut deltas: Vec<f64> = pressures.windows(2).map(|w| w[1] - w[0]).collect();
    sanitize_all(&mut deltas);

    let (peak_count, valley_count) = count_extrema(&pressures);

    PressureDynamics {
        min: finite_or_zero(min),
        max: finite_or_zero(max),
        mean: finite_or_zero(mean(&pressures).unwrap_or(DEFAULT_PRESSURE)),
        variance: finite_or_zero(variance(&pressures)),
        deltas,
        peak_count,
        valley_count,
    }
}

/// Count strict local maxima and minima (sequences shorter than 3 have none)
fn count_extrema(values: &[f64]) -> (u32, u32) {
    let mut peaks = 0;
    let mut valleys = 0;
    for w in values.windows(3) {
        if w[1] > w[0] && w[1] > w[2] {
            peaks += 1;
        } else if w[1] < w[0] && w[1] < w[2] {
            valleys += 1;
        }
    }
    (peaks, valleys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceType, Point, Stroke};

    fn collection(pressures: &[&[f64]]) -> StrokeCollection {
        let strokes = pressures
            .iter()
            .map(|stroke| {
                let points = stroke
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| Point::new(i as f64, 0.0, p, i as f64 * 10.0))
                    .collect();
                Stroke::new(points, DeviceType::Pen)
            })
            .collect();
        StrokeCollection::new(strokes)
    }

    #[test]
    fn test_empty_defaults_mean() {
        let dynamics = derive(&StrokeCollection::default());
        assert_eq!(dynamics.mean, DEFAULT_PRESSURE);
        assert_eq!(dynamics.min, 0.0);
        assert_eq!(dynamics.max, 0.0);
        assert_eq!(dynamics.variance, 0.0);
        assert!(dynamics.deltas.is_empty());
    }

    #[test]
    fn test_basic_statistics() {
        let dynamics = derive(&collection(&[&[0.2, 0.4, 0.6]]));
        assert_eq!(dynamics.min, 0.2);
        assert_eq!(dynamics.max, 0.6);
        assert!((dynamics.mean - 0.4).abs() < 1e-12);
        assert!((dynamics.variance - 0.08 / 3.0).abs() < 1e-12);
        assert_eq!(dynamics.deltas.len(), 2);
    }

    #[test]
    fn test_single_sample_has_zero_variance() {
        let dynamics = derive(&collection(&[&[0.7]]));
        assert_eq!(dynamics.variance, 0.0);
        assert_eq!(dynamics.peak_count, 0);
        assert_eq!(dynamics.valley_count, 0);
    }

    #[test]
    fn test_extrema_span_stroke_boundaries() {
        // Concatenated: 0.2 0.5 | 0.3 0.6 0.1
        let dynamics = derive(&collection(&[&[0.2, 0.5], &[0.3, 0.6, 0.1]]));
        assert_eq!(dynamics.peak_count, 2);
        assert_eq!(dynamics.valley_count, 1);
        assert_eq!(dynamics.deltas.len(), 4);
    }

    #[test]
    fn test_plateaus_are_not_extrema() {
        let dynamics = derive(&collection(&[&[0.5, 0.5, 0.5, 0.5]]));
        assert_eq!(dynamics.peak_count, 0);
        assert_eq!(dynamics.valley_count, 0);
    }
}
