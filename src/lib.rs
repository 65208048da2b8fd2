//! Strokeprint - Stroke biometric feature extraction and similarity scoring
//!
//! Strokeprint turns captured pen/touch strokes into a fixed-shape feature set
//! and scores how closely a candidate matches an enrolled reference through a
//! deterministic pipeline: capture adaptation → validation → feature
//! extraction → baseline comparison → audit encoding.
//!
//! ## Modules
//!
//! - **Extraction**: `features` derives pressure, timing, geometric, and security descriptors
//! - **Scoring**: `scorer` compares two feature sets and recommends accept/review/reject
//! - **Enrollment**: `baseline` and `enrollment` hold versioned per-user references
//! - **Integration**: `pipeline` (Rust API), `ffi` (C ABI), and the `strokeprint` CLI

pub mod baseline;
pub mod config;
pub mod encoder;
pub mod enrollment;
pub mod error;
pub mod features;
pub mod ml;
pub mod pipeline;
pub mod schema;
pub mod scorer;
pub mod types;
pub mod validator;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::ComputeError;
pub use features::{extract, FeatureExtractor};
pub use pipeline::{compare_json, extract_json, verify_json, AuthProcessor};
pub use scorer::{compare, SimilarityScorer};
pub use validator::{is_valid, validate};

// Schema exports
pub use schema::{RawCapture, RawCaptureAdapter};

// Core type exports
pub use types::{
    BiometricFeatureSet, BiometricType, ComparisonResult, Point, ReasonCode, Recommendation,
    Stroke, StrokeCollection,
};

/// Strokeprint version embedded in all audit records
pub const STROKEPRINT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for audit records
pub const PRODUCER_NAME: &str = "strokeprint";
