//! Raw capture payloads
//!
//! Captures arrive from browser canvases in a handful of legacy layouts:
//! `{ "strokes": [...] }`, `{ "raw": [...] }`, `{ "data": [...] }`, or a bare
//! array of strokes. Each stroke is either an object with a `points` list or a
//! bare array of points. `RawCapture` accepts all of them as one explicit
//! union; `RawCaptureAdapter` turns any of them into a `StrokeCollection`.

use crate::types::{BiometricType, DeviceType};
use serde::{Deserialize, Serialize};

/// A raw point as reported by the capture surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
    /// Missing on devices without pressure sensing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Milliseconds; some producers call this `time` or `t`
    #[serde(
        default,
        alias = "time",
        alias = "t",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<f64>,
    #[serde(default, alias = "tiltX", skip_serializing_if = "Option::is_none")]
    pub tilt_x: Option<f64>,
    #[serde(default, alias = "tiltY", skip_serializing_if = "Option::is_none")]
    pub tilt_y: Option<f64>,
    #[serde(
        default,
        alias = "contactRadiusX",
        alias = "radiusX",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_radius_x: Option<f64>,
    #[serde(
        default,
        alias = "contactRadiusY",
        alias = "radiusY",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_radius_y: Option<f64>,
}

/// A stroke object with metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStrokeRecord {
    /// `None` when the producer sent `null` or omitted the list
    #[serde(default)]
    pub points: Option<Vec<RawPoint>>,
    #[serde(
        default,
        alias = "deviceType",
        alias = "pointerType",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_type: Option<DeviceType>,
    #[serde(default, alias = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, alias = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

/// A stroke in either of its accepted layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStroke {
    Points(Vec<RawPoint>),
    Record(RawStrokeRecord),
}

impl RawStroke {
    pub fn points(&self) -> Option<&[RawPoint]> {
        match self {
            RawStroke::Points(points) => Some(points),
            RawStroke::Record(record) => record.points.as_deref(),
        }
    }

    pub fn device_type(&self) -> Option<DeviceType> {
        match self {
            RawStroke::Points(_) => None,
            RawStroke::Record(record) => record.device_type,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        match self {
            RawStroke::Points(_) => None,
            RawStroke::Record(record) => record.start_time,
        }
    }

    pub fn end_time(&self) -> Option<f64> {
        match self {
            RawStroke::Points(_) => None,
            RawStroke::Record(record) => record.end_time,
        }
    }
}

/// A capture payload in any of the accepted layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCapture {
    Strokes {
        strokes: Vec<RawStroke>,
        #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
        biometric_type: Option<BiometricType>,
    },
    Raw {
        raw: Vec<RawStroke>,
        #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
        biometric_type: Option<BiometricType>,
    },
    Data {
        data: Vec<RawStroke>,
        #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
        biometric_type: Option<BiometricType>,
    },
    Bare(Vec<RawStroke>),
}

impl RawCapture {
    pub fn strokes(&self) -> &[RawStroke] {
        match self {
            RawCapture::Strokes { strokes, .. } => strokes,
            RawCapture::Raw { raw, .. } => raw,
            RawCapture::Data { data, .. } => data,
            RawCapture::Bare(strokes) => strokes,
        }
    }

    pub fn biometric_type(&self) -> Option<BiometricType> {
        match self {
            RawCapture::Strokes { biometric_type, .. }
            | RawCapture::Raw { biometric_type, .. }
            | RawCapture::Data { biometric_type, .. } => *biometric_type,
            RawCapture::Bare(_) => None,
        }
    }
}
