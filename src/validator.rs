//! Capture validation
//!
//! Structural and numeric checks run before captured data is trusted by the
//! extractor. Validation is a pure predicate: it reports every problem it
//! finds and changes nothing.
//!
//! Zero strokes, single-point strokes, and coincident timestamps are all
//! valid here; the extractor handles them with defined defaults.

use crate::schema::RawCapture;
use crate::types::{Point, StrokeCollection};
use std::fmt;
use thiserror::Error;

/// Point field a validation issue refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointField {
    X,
    Y,
    Pressure,
    Timestamp,
    TiltX,
    TiltY,
    ContactRadiusX,
    ContactRadiusY,
}

impl fmt::Display for PointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointField::X => "x",
            PointField::Y => "y",
            PointField::Pressure => "pressure",
            PointField::Timestamp => "timestamp",
            PointField::TiltX => "tilt_x",
            PointField::TiltY => "tilt_y",
            PointField::ContactRadiusX => "contact_radius_x",
            PointField::ContactRadiusY => "contact_radius_y",
        };
        f.write_str(name)
    }
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("stroke {stroke}, point {point}: {field} is not a finite number")]
    NonFinite {
        stroke: usize,
        point: usize,
        field: PointField,
    },

    #[error("stroke {stroke}, point {point}: pressure {value} is outside [0, 1]")]
    PressureOutOfRange {
        stroke: usize,
        point: usize,
        value: f64,
    },

    #[error("stroke {stroke}: point list is missing")]
    MissingPoints { stroke: usize },
}

/// Every problem found in one capture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// First issue as an error, if any
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

/// Validate a normalized stroke collection
pub fn validate(collection: &StrokeCollection) -> ValidationReport {
    let mut issues = Vec::new();
    for (stroke_idx, stroke) in collection.strokes.iter().enumerate() {
        for (point_idx, point) in stroke.points.iter().enumerate() {
            check_point(point, stroke_idx, point_idx, &mut issues);
        }
    }
    ValidationReport { issues }
}

/// Shorthand for `validate(collection).is_valid()`
pub fn is_valid(collection: &StrokeCollection) -> bool {
    validate(collection).is_valid()
}

/// Validate the structure of a raw capture before normalization.
///
/// A stroke whose point list is `null` or absent is rejected; an empty list is
/// accepted as a zero-content stroke. Values present in the raw points are
/// checked the same way as in [`validate`].
pub fn validate_capture(capture: &RawCapture) -> ValidationReport {
    let mut issues = Vec::new();
    for (stroke_idx, stroke) in capture.strokes().iter().enumerate() {
        let Some(points) = stroke.points() else {
            issues.push(ValidationError::MissingPoints { stroke: stroke_idx });
            continue;
        };
        for (point_idx, raw) in points.iter().enumerate() {
            let coords = [
                (PointField::X, Some(raw.x)),
                (PointField::Y, Some(raw.y)),
                (PointField::Pressure, raw.pressure),
                (PointField::Timestamp, raw.timestamp),
            ];
            for (field, value) in coords {
                if value.is_some_and(|v| !v.is_finite()) {
                    issues.push(ValidationError::NonFinite {
                        stroke: stroke_idx,
                        point: point_idx,
                        field,
                    });
                }
            }
            if let Some(pressure) = raw.pressure.filter(|p| p.is_finite()) {
                if !(0.0..=1.0).contains(&pressure) {
                    issues.push(ValidationError::PressureOutOfRange {
                        stroke: stroke_idx,
                        point: point_idx,
                        value: pressure,
                    });
                }
            }
        }
    }
    ValidationReport { issues }
}

fn check_point(point: &Point, stroke: usize, idx: usize, issues: &mut Vec<ValidationError>) {
    let required = [
        (PointField::X, point.x),
        (PointField::Y, point.y),
        (PointField::Pressure, point.pressure),
        (PointField::Timestamp, point.timestamp),
    ];
    for (field, value) in required {
        if !value.is_finite() {
            issues.push(ValidationError::NonFinite {
                stroke,
                point: idx,
                field,
            });
        }
    }

    let optional = [
        (PointField::TiltX, point.tilt_x),
        (PointField::TiltY, point.tilt_y),
        (PointField::ContactRadiusX, point.contact_radius_x),
        (PointField::ContactRadiusY, point.contact_radius_y),
    ];
    for (field, value) in optional {
        if value.is_some_and(|v| !v.is_finite()) {
            issues.push(ValidationError::NonFinite {
                stroke,
                point: idx,
                field,
            });
        }
    }

    if point.pressure.is_finite() && !(0.0..=1.0).contains(&point.pressure) {
        issues.push(ValidationError::PressureOutOfRange {
            stroke,
            point: idx,
            value: point.pressure,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawCaptureAdapter;
    use crate::types::{DeviceType, Stroke};

    fn stroke(points: Vec<Point>) -> Stroke {
        Stroke::new(points, DeviceType::Pen)
    }

    #[test]
    fn test_empty_collection_is_valid() {
        assert!(is_valid(&StrokeCollection::default()));
    }

    #[test]
    fn test_single_point_and_coincident_timestamps_are_valid() {
        let collection = StrokeCollection::new(vec![
            stroke(vec![Point::new(1.0, 1.0, 0.5, 0.0)]),
            stroke(vec![
                Point::new(0.0, 0.0, 0.5, 10.0),
                Point::new(5.0, 5.0, 0.5, 10.0),
            ]),
        ]);
        assert!(is_valid(&collection));
    }

    #[test]
    fn test_rejects_nan_and_infinity() {
        let collection = StrokeCollection::new(vec![stroke(vec![
            Point::new(f64::NAN, 0.0, 0.5, 0.0),
            Point::new(0.0, 0.0, 0.5, f64::INFINITY),
        ])]);

        let report = validate(&collection);
        assert!(!report.is_valid());
        assert_eq!(report.issues.len(), 2);
        assert_eq!(
            report.issues[0],
            ValidationError::NonFinite {
                stroke: 0,
                point: 0,
                field: PointField::X
            }
        );
        assert_eq!(
            report.issues[1],
            ValidationError::NonFinite {
                stroke: 0,
                point: 1,
                field: PointField::Timestamp
            }
        );
    }

    #[test]
    fn test_rejects_non_finite_tilt() {
        let mut point = Point::new(0.0, 0.0, 0.5, 0.0);
        point.tilt_y = Some(f64::NEG_INFINITY);
        let collection = StrokeCollection::new(vec![stroke(vec![point])]);

        let report = validate(&collection);
        assert_eq!(
            report.into_result().unwrap_err(),
            ValidationError::NonFinite {
                stroke: 0,
                point: 0,
                field: PointField::TiltY
            }
        );
    }

    #[test]
    fn test_rejects_pressure_out_of_range() {
        let collection =
            StrokeCollection::new(vec![stroke(vec![Point::new(0.0, 0.0, 1.5, 0.0)])]);
        let report = validate(&collection);
        assert!(matches!(
            report.issues[0],
            ValidationError::PressureOutOfRange { value, .. } if value == 1.5
        ));
    }

    #[test]
    fn test_capture_with_null_points_is_rejected() {
        let capture = RawCaptureAdapter::parse(
            r#"{ "strokes": [ { "points": [ { "x": 1, "y": 2 } ] }, { "points": null } ] }"#,
        )
        .unwrap();

        let report = validate_capture(&capture);
        assert_eq!(
            report.issues,
            vec![ValidationError::MissingPoints { stroke: 1 }]
        );
    }

    #[test]
    fn test_capture_with_absent_points_is_rejected() {
        let capture = RawCaptureAdapter::parse(r#"{ "strokes": [ { "startTime": 0 } ] }"#).unwrap();
        assert!(!validate_capture(&capture).is_valid());
    }

    #[test]
    fn test_capture_with_empty_points_is_accepted() {
        let capture = RawCaptureAdapter::parse(r#"{ "strokes": [ { "points": [] } ] }"#).unwrap();
        assert!(validate_capture(&capture).is_valid());
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = ValidationError::NonFinite {
            stroke: 2,
            point: 7,
            field: PointField::Pressure,
        };
        assert_eq!(
            err.to_string(),
            "stroke 2, point 7: pressure is not a finite number"
        );
    }
}
