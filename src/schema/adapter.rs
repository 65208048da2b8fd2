//! Adapter for converting raw captures into stroke collections
//!
//! This is the one normalization step between the capture surface and the
//! engine: layout differences, missing pressure, and missing timestamps are
//! all resolved here so the extractor only ever sees `StrokeCollection`.

use crate::error::ComputeError;
use crate::schema::capture::{RawCapture, RawStroke};
use crate::types::{Point, Stroke, StrokeCollection, DEFAULT_PRESSURE};
use crate::validator::validate_capture;

/// Adapter for converting raw captures to stroke collections
pub struct RawCaptureAdapter;

impl RawCaptureAdapter {
    /// Parse a capture JSON string in any accepted layout
    pub fn parse(json: &str) -> Result<RawCapture, ComputeError> {
        serde_json::from_str(json)
            .map_err(|e| ComputeError::ParseError(format!("Failed to parse capture: {}", e)))
    }

    /// Convert a raw capture into a stroke collection.
    ///
    /// The capture is structurally validated first. Then:
    /// - missing pressure becomes 0.5
    /// - a missing timestamp repeats the previous point's timestamp; the first
    ///   point falls back to the stroke's `start_time`, then to the previous
    ///   stroke's last timestamp, then to 0; the last point takes the stroke's
    ///   `end_time` when one is given
    /// - missing device type becomes `mouse`
    pub fn normalize(capture: &RawCapture) -> Result<StrokeCollection, ComputeError> {
        validate_capture(capture).into_result()?;

        let mut last_timestamp: Option<f64> = None;
        let strokes = capture
            .strokes()
            .iter()
            .map(|raw| convert_stroke(raw, &mut last_timestamp))
            .collect();

        Ok(StrokeCollection {
            strokes,
            biometric_type: capture.biometric_type(),
        })
    }

    /// Parse and normalize in one step
    pub fn from_json(json: &str) -> Result<StrokeCollection, ComputeError> {
        let capture = Self::parse(json)?;
        Self::normalize(&capture)
    }
}

fn convert_stroke(raw: &RawStroke, last_timestamp: &mut Option<f64>) -> Stroke {
    let mut carried = raw.start_time().or(*last_timestamp).unwrap_or(0.0);
    let raw_points = raw.points().unwrap_or_default();
    let last_index = raw_points.len().saturating_sub(1);

    let points = raw_points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let fallback = match raw.end_time() {
                Some(end) if i > 0 && i == last_index => end,
                _ => carried,
            };
            let timestamp = p.timestamp.unwrap_or(fallback);
            carried = timestamp;
            Point {
                x: p.x,
                y: p.y,
                pressure: p.pressure.unwrap_or(DEFAULT_PRESSURE),
                timestamp,
                tilt_x: p.tilt_x,
                tilt_y: p.tilt_y,
                contact_radius_x: p.contact_radius_x,
                contact_radius_y: p.contact_radius_y,
            }
        })
        .collect::<Vec<_>>();

    if let Some(last) = points.last() {
        *last_timestamp = Some(last.timestamp);
    }

    Stroke::new(points, raw.device_type().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BiometricType, DeviceType};

    #[test]
    fn test_normalize_applies_defaults() {
        let json = r#"{
            "strokes": [
                { "points": [ { "x": 0, "y": 0, "timestamp": 100 }, { "x": 1, "y": 1 } ] }
            ]
        }"#;
        let collection = RawCaptureAdapter::from_json(json).unwrap();

        let stroke = &collection.strokes[0];
        assert_eq!(stroke.device_type, DeviceType::Mouse);
        assert_eq!(stroke.points[0].pressure, DEFAULT_PRESSURE);
        assert_eq!(stroke.points[1].timestamp, 100.0);
    }

    #[test]
    fn test_timestamps_carry_across_strokes() {
        let json = r#"[
            [ { "x": 0, "y": 0, "t": 10 }, { "x": 1, "y": 0, "t": 20 } ],
            [ { "x": 5, "y": 5 } ]
        ]"#;
        let collection = RawCaptureAdapter::from_json(json).unwrap();
        assert_eq!(collection.strokes[1].points[0].timestamp, 20.0);
    }

    #[test]
    fn test_stroke_start_time_seeds_missing_timestamps() {
        let json = r#"{ "raw": [ { "points": [ { "x": 0, "y": 0 } ], "startTime": 42 } ] }"#;
        let collection = RawCaptureAdapter::from_json(json).unwrap();
        assert_eq!(collection.strokes[0].points[0].timestamp, 42.0);
    }

    #[test]
    fn test_stroke_end_time_seeds_missing_last_timestamp() {
        let json = r#"{ "strokes": [
            { "points": [ { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": 2, "y": 0 } ],
              "startTime": 100, "endTime": 250 },
            [ { "x": 5, "y": 5 } ]
        ] }"#;
        let collection = RawCaptureAdapter::from_json(json).unwrap();

        let first: Vec<f64> = collection.strokes[0].points.iter().map(|p| p.timestamp).collect();
        assert_eq!(first, vec![100.0, 100.0, 250.0]);
        assert_eq!(collection.strokes[0].duration(), 150.0);
        assert_eq!(collection.strokes[1].points[0].timestamp, 250.0);
    }

    #[test]
    fn test_end_time_does_not_override_reported_timestamp() {
        let json = r#"{ "strokes": [
            { "points": [ { "x": 0, "y": 0, "timestamp": 10 }, { "x": 1, "y": 0, "timestamp": 30 } ],
              "endTime": 99 }
        ] }"#;
        let collection = RawCaptureAdapter::from_json(json).unwrap();
        assert_eq!(collection.strokes[0].points[1].timestamp, 30.0);
    }

    #[test]
    fn test_biometric_type_preserved() {
        let json = r#"{ "type": "shape", "data": [ [ { "x": 0, "y": 0, "pressure": 0.7 } ] ] }"#;
        let collection = RawCaptureAdapter::from_json(json).unwrap();
        assert_eq!(collection.biometric_type, Some(BiometricType::Shape));
        assert_eq!(collection.strokes[0].points[0].pressure, 0.7);
    }

    #[test]
    fn test_missing_points_is_an_error() {
        let result = RawCaptureAdapter::from_json(r#"{ "strokes": [ { "points": null } ] }"#);
        assert!(matches!(result, Err(ComputeError::Validation(_))));
    }

    #[test]
    fn test_out_of_range_pressure_is_an_error() {
        let result =
            RawCaptureAdapter::from_json(r#"[ [ { "x": 0, "y": 0, "pressure": 3.0 } ] ]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_capture_normalizes_to_empty_collection() {
        let collection = RawCaptureAdapter::from_json("[]").unwrap();
        assert_eq!(collection.stroke_count(), 0);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = RawCaptureAdapter::from_json("not json");
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }
}
