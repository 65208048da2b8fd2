//! Geometric shape properties

use crate::features::stats::{finite_or_zero, mean, safe_div, sanitize_all, std_dev};
use crate::types::{BoundingBox, Centroid, GeometricProperties, Point, StrokeCollection};
use std::f64::consts::PI;

/// Upper bound on points used for the symmetry search; larger captures are
/// sampled at an even stride
const MAX_SYMMETRY_SAMPLES: usize = 256;

/// Derive geometric properties
pub fn derive(collection: &StrokeCollection) -> GeometricProperties {
    let points: Vec<&Point> = collection.points().collect();
    if points.is_empty() {
        return GeometricProperties::default();
    }

    let bounding_box = bounding_box(&points);
    let centroid = Centroid {
        x: finite_or_zero(points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64),
        y: finite_or_zero(points.iter().map(|p| p.y).sum::<f64>() / points.len() as f64),
    };

    let mut stroke_lengths: Vec<f64> = collection.strokes.iter().map(|s| s.path_length()).collect();
    sanitize_all(&mut stroke_lengths);
    let total_path_length = finite_or_zero(stroke_lengths.iter().sum());

    let stroke_durations: Vec<f64> = collection.strokes.iter().map(|s| s.duration()).collect();

    let (mut turn_angles, mut curvature) = turning(collection);
    sanitize_all(&mut turn_angles);
    sanitize_all(&mut curvature);

    let sample = symmetry_sample(&points);
    let diagonal = bounding_box.diagonal();

    GeometricProperties {
        bounding_box,
        centroid,
        aspect_ratio: safe_div(bounding_box.width, bounding_box.height),
        area: finite_or_zero(bounding_box.width * bounding_box.height),
        total_path_length,
        average_stroke_length: finite_or_zero(mean(&stroke_lengths).unwrap_or(0.0)),
        stroke_length_std: finite_or_zero(std_dev(&stroke_lengths)),
        average_stroke_duration: finite_or_zero(mean(&stroke_durations).unwrap_or(0.0)),
        stroke_duration_std: finite_or_zero(std_dev(&stroke_durations)),
        stroke_lengths,
        turn_angles,
        curvature,
        horizontal_symmetry: mirror_symmetry(&sample, diagonal, |p| (p.x, 2.0 * centroid.y - p.y)),
        vertical_symmetry: mirror_symmetry(&sample, diagonal, |p| (2.0 * centroid.x - p.x, p.y)),
    }
}

fn bounding_box(points: &[&Point]) -> BoundingBox {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingBox {
        min_x: finite_or_zero(min_x),
        min_y: finite_or_zero(min_y),
        max_x: finite_or_zero(max_x),
        max_y: finite_or_zero(max_y),
        width: finite_or_zero(max_x - min_x),
        height: finite_or_zero(max_y - min_y),
    }
}

/// Turn angle and curvature at every interior point of every stroke.
///
/// The turn is the signed angle from the incoming to the outgoing segment,
/// in (-π, π]; it is 0 when either segment has zero length. Curvature is the
/// turn divided by the mean length of the two segments.
fn turning(collection: &StrokeCollection) -> (Vec<f64>, Vec<f64>) {
    let mut angles = Vec::new();
    let mut curvature = Vec::new();

    for stroke in &collection.strokes {
        for w in stroke.points.windows(3) {
            let (ax, ay) = (w[1].x - w[0].x, w[1].y - w[0].y);
            let (bx, by) = (w[2].x - w[1].x, w[2].y - w[1].y);
            let len_a = ax.hypot(ay);
            let len_b = bx.hypot(by);

            let angle = if len_a == 0.0 || len_b == 0.0 {
                0.0
            } else {
                normalize_angle((ax * by - ay * bx).atan2(ax * bx + ay * by))
            };

            angles.push(angle);
            curvature.push(safe_div(angle, (len_a + len_b) / 2.0));
        }
    }

    (angles, curvature)
}

/// Wrap an angle into (-π, π]
fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

fn symmetry_sample<'a>(points: &[&'a Point]) -> Vec<&'a Point> {
    if points.len() <= MAX_SYMMETRY_SAMPLES {
        return points.to_vec();
    }
    let stride = points.len().div_ceil(MAX_SYMMETRY_SAMPLES);
    points.iter().step_by(stride).copied().collect()
}

/// Reflect each point and measure the mean distance to its nearest original
/// point, normalized by the bounding-box diagonal. 1 = perfect mirror image.
fn mirror_symmetry<F>(points: &[&Point], diagonal: f64, reflect: F) -> f64
where
    F: Fn(&Point) -> (f64, f64),
{
    if points.is_empty() {
        return 0.0;
    }
    if diagonal <= 0.0 {
        return 1.0;
    }

    let total: f64 = points
        .iter()
        .map(|p| {
            let (rx, ry) = reflect(p);
            points
                .iter()
                .map(|q| (q.x - rx).hypot(q.y - ry))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    let mean_distance = total / points.len() as f64;
    finite_or_zero(1.0 - (mean_distance / diagonal).min(1.0)).clamp(0.0, 1.0)
}
