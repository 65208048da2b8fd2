//! Timing patterns
//!
//! Durations and speeds are in milliseconds and pixels per millisecond.

use crate::features::stats::{finite_or_zero, mean, regularity, safe_div, sanitize_all, std_dev, variance};
use crate::types::{Speed, StrokeCollection, TimingPatterns};

/// Derive timing patterns.
///
/// `total_path_length` is passed in from the geometry group so the average
/// speed uses exactly the same length.
pub fn derive(collection: &StrokeCollection, total_path_length: f64) -> TimingPatterns {
    let total_duration = capture_duration(collection);

    let mut stroke_durations: Vec<f64> = collection.strokes.iter().map(|s| s.duration()).collect();
    sanitize_all(&mut stroke_durations);

    let mut pauses: Vec<f64> = collection
        .non_empty_strokes()
        .collect::<Vec<_>>()
        .windows(2)
        .map(|pair| (pair[1].start_time() - pair[0].end_time()).max(0.0))
        .collect();
    sanitize_all(&mut pauses);

    let speeds = segment_speeds(collection);

    TimingPatterns {
        total_duration,
        rhythm_score: regularity(&stroke_durations),
        consistency_score: regularity(&speeds),
        average_speed: average_speed(total_path_length, total_duration),
        mean_segment_speed: finite_or_zero(mean(&speeds).unwrap_or(0.0)),
        speed_variance: finite_or_zero(variance(&speeds)),
        speed_std: finite_or_zero(std_dev(&speeds)),
        max_speed: speeds.iter().copied().fold(0.0, f64::max),
        min_speed: speeds
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0),
        stroke_durations,
        pauses,
    }
}

/// Last timestamp minus first timestamp over the whole capture (0 for ≤ 1 point)
fn capture_duration(collection: &StrokeCollection) -> f64 {
    if collection.total_points() <= 1 {
        return 0.0;
    }
    let mut non_empty = collection.non_empty_strokes();
    let start = non_empty.next().map(|s| s.start_time());
    let end = collection
        .non_empty_strokes()
        .last()
        .map(|s| s.end_time());
    match (start, end) {
        (Some(start), Some(end)) => finite_or_zero((end - start).max(0.0)),
        _ => 0.0,
    }
}

/// Speed of every consecutive point pair within a stroke; pairs with Δt ≤ 0 are skipped
pub(crate) fn segment_speeds(collection: &StrokeCollection) -> Vec<f64> {
    let mut speeds: Vec<f64> = collection
        .strokes
        .iter()
        .flat_map(|stroke| stroke.points.windows(2))
        .filter_map(|pair| {
            let dt = pair[1].timestamp - pair[0].timestamp;
            (dt > 0.0).then(|| pair[0].distance_to(&pair[1]) / dt)
        })
        .collect();
    sanitize_all(&mut speeds);
    speeds
}

/// Path length over duration; distance covered in zero time is `Unbounded`
fn average_speed(total_path_length: f64, total_duration: f64) -> Speed {
    if total_duration > 0.0 {
        Speed::Measured(safe_div(total_path_length, total_duration))
    } else if total_path_length > 0.0 {
        Speed::Unbounded
    } else {
        Speed::Measured(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceType, Point, Stroke};

    fn stroke(points: &[(f64, f64, f64)]) -> Stroke {
        Stroke::new(
            points
                .iter()
                .map(|&(x, y, t)| Point::new(x, y, 0.5, t))
                .collect(),
            DeviceType::Pen,
        )
    }

    #[test]
    fn test_single_stroke_timing() {
        let collection = StrokeCollection::new(vec![stroke(&[
            (0.0, 0.0, 0.0),
            (3.0, 4.0, 100.0),
            (3.0, 4.0, 200.0),
        ])]);
        let timing = derive(&collection, 5.0);

        assert_eq!(timing.total_duration, 200.0);
        assert_eq!(timing.stroke_durations, vec![200.0]);
        assert!(timing.pauses.is_empty());
        assert_eq!(timing.average_speed, Speed::Measured(0.025));
        assert_eq!(timing.max_speed, 0.05);
        assert_eq!(timing.min_speed, 0.0);
        assert!((timing.speed_variance - 0.000625).abs() < 1e-12);
    }

    #[test]
    fn test_pauses_between_strokes() {
        let collection = StrokeCollection::new(vec![
            stroke(&[(0.0, 0.0, 0.0), (1.0, 0.0, 50.0)]),
            stroke(&[(2.0, 0.0, 80.0), (3.0, 0.0, 120.0)]),
            stroke(&[(4.0, 0.0, 200.0), (5.0, 0.0, 260.0)]),
        ]);
        let timing = derive(&collection, 3.0);

        assert_eq!(timing.pauses, vec![30.0, 80.0]);
        assert_eq!(timing.stroke_durations, vec![50.0, 40.0, 60.0]);
        assert_eq!(timing.total_duration, 260.0);
    }

    #[test]
    fn test_coincident_timestamps_give_unbounded_speed() {
        let collection = StrokeCollection::new(vec![stroke(&[
            (0.0, 0.0, 10.0),
            (5.0, 5.0, 10.0),
            (9.0, 9.0, 10.0),
        ])]);
        let timing = derive(&collection, 12.0);

        assert_eq!(timing.total_duration, 0.0);
        assert!(timing.average_speed.is_unbounded());
        assert_eq!(timing.speed_variance, 0.0);
        assert_eq!(timing.consistency_score, 0.0);
    }

    #[test]
    fn test_stationary_zero_duration_is_zero_speed() {
        let collection = StrokeCollection::new(vec![stroke(&[(1.0, 1.0, 5.0)])]);
        let timing = derive(&collection, 0.0);
        assert_eq!(timing.average_speed, Speed::Measured(0.0));
        assert_eq!(timing.total_duration, 0.0);
    }

    #[test]
    fn test_rhythm_prefers_regular_strokes() {
        let regular = StrokeCollection::new(vec![
            stroke(&[(0.0, 0.0, 0.0), (1.0, 0.0, 100.0)]),
            stroke(&[(0.0, 0.0, 200.0), (1.0, 0.0, 300.0)]),
        ]);
        let irregular = StrokeCollection::new(vec![
            stroke(&[(0.0, 0.0, 0.0), (1.0, 0.0, 10.0)]),
            stroke(&[(0.0, 0.0, 200.0), (1.0, 0.0, 600.0)]),
        ]);

        assert!(derive(&regular, 2.0).rhythm_score > derive(&irregular, 2.0).rhythm_score);
    }

    #[test]
    fn test_empty_collection() {
        let timing = derive(&StrokeCollection::default(), 0.0);
        assert_eq!(timing.total_duration, 0.0);
        assert_eq!(timing.rhythm_score, 0.0);
        assert_eq!(timing.average_speed, Speed::Measured(0.0));
    }
}
