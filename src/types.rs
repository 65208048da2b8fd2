//! Core data types
//!
//! Capture data (points, strokes, collections) flows in; derived descriptors
//! (`BiometricFeatureSet`) and comparison outcomes (`ComparisonResult`) flow
//! out. Every output type is JSON-serializable for persistence and audit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pressure assumed when the input device does not report one
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Input device that produced a stroke
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Kind of biometric being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricType {
    Signature,
    Shape,
    Drawing,
}

impl BiometricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiometricType::Signature => "signature",
            BiometricType::Shape => "shape",
            BiometricType::Drawing => "drawing",
        }
    }
}

impl std::str::FromStr for BiometricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signature" => Ok(BiometricType::Signature),
            "shape" => Ok(BiometricType::Shape),
            "drawing" => Ok(BiometricType::Drawing),
            other => Err(format!(
                "unknown biometric type '{other}', expected signature, shape, or drawing"
            )),
        }
    }
}

impl std::fmt::Display for BiometricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sampled pen/touch/mouse position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Normalized pressure (0-1)
    #[serde(default = "default_pressure")]
    pub pressure: f64,
    /// Monotonic capture time in milliseconds
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_radius_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_radius_y: Option<f64>,
}

fn default_pressure() -> f64 {
    DEFAULT_PRESSURE
}

impl Point {
    pub fn new(x: f64, y: f64, pressure: f64, timestamp: f64) -> Self {
        Self {
            x,
            y,
            pressure,
            timestamp,
            tilt_x: None,
            tilt_y: None,
            contact_radius_x: None,
            contact_radius_y: None,
        }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// One continuous contact, from down-event to up-event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    #[serde(default)]
    pub device_type: DeviceType,
}

impl Stroke {
    pub fn new(points: Vec<Point>, device_type: DeviceType) -> Self {
        Self {
            points,
            device_type,
        }
    }

    /// Timestamp of the first point (0 for an empty stroke)
    pub fn start_time(&self) -> f64 {
        self.points.first().map(|p| p.timestamp).unwrap_or(0.0)
    }

    /// Timestamp of the last point (0 for an empty stroke)
    pub fn end_time(&self) -> f64 {
        self.points.last().map(|p| p.timestamp).unwrap_or(0.0)
    }

    /// `end_time - start_time`, never negative
    pub fn duration(&self) -> f64 {
        (self.end_time() - self.start_time()).max(0.0)
    }

    /// Sum of distances between consecutive points
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// All strokes from one capture session (one signature, shape, or drawing)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeCollection {
    pub strokes: Vec<Stroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_type: Option<BiometricType>,
}

impl StrokeCollection {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            biometric_type: None,
        }
    }

    pub fn with_biometric_type(mut self, biometric_type: BiometricType) -> Self {
        self.biometric_type = Some(biometric_type);
        self
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn total_points(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// All points across strokes, in stroke order
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.strokes.iter().flat_map(|s| s.points.iter())
    }

    /// Strokes that carry at least one point
    pub fn non_empty_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Feature set
// ============================================================================

/// Basic counts over the collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicCounts {
    pub stroke_count: u32,
    pub total_points: u32,
    pub average_points_per_stroke: f64,
}

/// Pressure dynamics over all points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureDynamics {
    pub min: f64,
    pub max: f64,
    /// Mean pressure (0.5 when there are no samples)
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Point-to-point pressure changes, strokes concatenated
    pub deltas: Vec<f64>,
    pub peak_count: u32,
    pub valley_count: u32,
}

/// Average drawing speed.
///
/// A capture whose points all share one timestamp but still cover distance has
/// no finite speed; that case is `Unbounded` rather than IEEE infinity.
/// Serialized as a number, or the string `"unbounded"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speed {
    Measured(f64),
    Unbounded,
}

impl Default for Speed {
    fn default() -> Self {
        Speed::Measured(0.0)
    }
}

impl Speed {
    /// The measured value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Speed::Measured(v) => Some(*v),
            Speed::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Speed::Unbounded)
    }
}

const UNBOUNDED_SPEED: &str = "unbounded";

impl Serialize for Speed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Speed::Measured(v) => serializer.serialize_f64(*v),
            Speed::Unbounded => serializer.serialize_str(UNBOUNDED_SPEED),
        }
    }
}

impl<'de> Deserialize<'de> for Speed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Tag(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Speed::Measured(v)),
            Repr::Tag(tag) if tag == UNBOUNDED_SPEED => Ok(Speed::Unbounded),
            Repr::Tag(other) => Err(serde::de::Error::custom(format!(
                "invalid speed '{other}', expected a number or \"{UNBOUNDED_SPEED}\""
            ))),
        }
    }
}

/// Timing patterns of the capture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingPatterns {
    /// Capture end minus capture start (ms)
    pub total_duration: f64,
    pub stroke_durations: Vec<f64>,
    /// Gaps between one stroke's end and the next stroke's start
    pub pauses: Vec<f64>,
    /// 0-1, higher = more regular stroke durations
    pub rhythm_score: f64,
    /// 0-1, higher = steadier segment speeds
    pub consistency_score: f64,
    /// Total path length over total duration (px/ms)
    pub average_speed: Speed,
    /// Mean of per-segment speeds
    pub mean_segment_speed: f64,
    /// Population variance of per-segment speeds
    pub speed_variance: f64,
    pub speed_std: f64,
    pub max_speed: f64,
    pub min_speed: f64,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Arithmetic mean of all point coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

/// Geometric shape properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometricProperties {
    pub bounding_box: BoundingBox,
    pub centroid: Centroid,
    /// width / height (0 when height is 0)
    pub aspect_ratio: f64,
    pub area: f64,
    pub total_path_length: f64,
    pub stroke_lengths: Vec<f64>,
    pub average_stroke_length: f64,
    pub stroke_length_std: f64,
    pub average_stroke_duration: f64,
    pub stroke_duration_std: f64,
    /// Signed turn at each interior point, in (-π, π]
    pub turn_angles: Vec<f64>,
    pub curvature: Vec<f64>,
    /// 0-1, mirror match about the horizontal centroid axis (top/bottom)
    pub horizontal_symmetry: f64,
    /// 0-1, mirror match about the vertical centroid axis (left/right)
    pub vertical_symmetry: f64,
}

/// Risk tags emitted when a security composite crosses its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    LowPressureVariance,
    ExcessiveSpeed,
    UnboundedSpeed,
    FewPoints,
    RoboticVelocity,
    ErraticVelocity,
}

impl RiskFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::LowPressureVariance => "low_pressure_variance",
            RiskFactor::ExcessiveSpeed => "excessive_speed",
            RiskFactor::UnboundedSpeed => "unbounded_speed",
            RiskFactor::FewPoints => "few_points",
            RiskFactor::RoboticVelocity => "robotic_velocity",
            RiskFactor::ErraticVelocity => "erratic_velocity",
        }
    }
}

/// Security and anomaly indicators derived from the other groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityIndicators {
    pub anomaly_score: f64,
    pub authenticity_score: f64,
    pub confidence_level: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub velocity_consistency: f64,
    pub pressure_consistency: f64,
}

/// Fixed-shape descriptor derived once per stroke collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiometricFeatureSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_type: Option<BiometricType>,
    pub basic: BasicCounts,
    pub pressure: PressureDynamics,
    pub timing: TimingPatterns,
    pub geometry: GeometricProperties,
    pub security: SecurityIndicators,
}

impl BiometricFeatureSet {
    /// True when the source collection had no points at all
    pub fn is_empty(&self) -> bool {
        self.basic.total_points == 0
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Authentication decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    Reject,
    Review,
}

/// Stable codes explaining what drove a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    PressureMismatch,
    TimingMismatch,
    GeometryMismatch,
    SecurityMismatch,
    StrokeCountMismatch,
    LowConfidence,
    InsufficientData,
    InvalidCapture,
    NoBaseline,
    MlDisagreement,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::PressureMismatch => "pressure_mismatch",
            ReasonCode::TimingMismatch => "timing_mismatch",
            ReasonCode::GeometryMismatch => "geometry_mismatch",
            ReasonCode::SecurityMismatch => "security_mismatch",
            ReasonCode::StrokeCountMismatch => "stroke_count_mismatch",
            ReasonCode::LowConfidence => "low_confidence",
            ReasonCode::InsufficientData => "insufficient_data",
            ReasonCode::InvalidCapture => "invalid_capture",
            ReasonCode::NoBaseline => "no_baseline",
            ReasonCode::MlDisagreement => "ml_disagreement",
        }
    }
}

/// Per-dimension similarity breakdown (each 0-1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub pressure: f64,
    pub timing: f64,
    pub geometry: f64,
    pub security: f64,
    pub overall: f64,
}

/// Outcome of comparing a candidate against a reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub score: f64,
    pub confidence: f64,
    pub match_details: MatchDetails,
    pub recommendation: Recommendation,
    pub reasons: Vec<ReasonCode>,
}

impl ComparisonResult {
    /// A reject carrying a single explanatory reason, for attempts that could
    /// not be scored at all
    pub fn rejected(reason: ReasonCode) -> Self {
        Self {
            score: 0.0,
            confidence: 0.0,
            match_details: MatchDetails::default(),
            recommendation: Recommendation::Reject,
            reasons: vec![reason],
        }
    }
}

// ============================================================================
// Audit records
// ============================================================================

/// Producer metadata embedded in every audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Baseline version an attempt was scored against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditBaseline {
    pub id: String,
    pub version: u32,
}

/// Persisted record of one authentication attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_version: String,
    pub attempt_id: String,
    pub producer: AuditProducer,
    pub computed_at_utc: String,
    pub user_id: String,
    pub biometric_type: BiometricType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<AuditBaseline>,
    pub result: ComparisonResult,
}
