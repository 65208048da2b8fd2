//! Audit encoding
//!
//! This module wraps comparison results into audit records carrying producer
//! metadata, an attempt id, and the time of computation.

use crate::baseline::Baseline;
use crate::error::ComputeError;
use crate::types::{AuditBaseline, AuditProducer, AuditRecord, BiometricType, ComparisonResult};
use crate::{PRODUCER_NAME, STROKEPRINT_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current audit record schema version
pub const AUDIT_VERSION: &str = "1.0.0";

/// Audit encoder for authentication attempts
pub struct AuditEncoder {
    instance_id: String,
}

impl Default for AuditEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode one attempt into an audit record
    pub fn encode(
        &self,
        user_id: &str,
        biometric_type: BiometricType,
        baseline: Option<&Baseline>,
        result: &ComparisonResult,
    ) -> Result<AuditRecord, ComputeError> {
        if !(result.score.is_finite() && result.confidence.is_finite()) {
            return Err(ComputeError::EncodingError(
                "comparison result contains non-finite values".to_string(),
            ));
        }

        let producer = AuditProducer {
            name: PRODUCER_NAME.to_string(),
            version: STROKEPRINT_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        Ok(AuditRecord {
            audit_version: AUDIT_VERSION.to_string(),
            attempt_id: Uuid::new_v4().to_string(),
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            user_id: user_id.to_string(),
            biometric_type,
            baseline: baseline.map(|b| AuditBaseline {
                id: b.id.to_string(),
                version: b.version,
            }),
            result: result.clone(),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        user_id: &str,
        biometric_type: BiometricType,
        baseline: Option<&Baseline>,
        result: &ComparisonResult,
    ) -> Result<String, ComputeError> {
        let record = self.encode(user_id, biometric_type, baseline, result)?;
        serde_json::to_string_pretty(&record).map_err(ComputeError::JsonError)
    }
}
