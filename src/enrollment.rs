//! Enrollment sessions
//!
//! Multi-step enrollment collects several samples before a baseline is
//! stored. Pending samples live in an explicit store keyed by session id;
//! sessions expire a fixed time after they start. Callers pass `now` so
//! expiry is deterministic.

use crate::error::ComputeError;
use crate::types::{BiometricFeatureSet, BiometricType};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Default session lifetime in minutes
pub const DEFAULT_ENROLLMENT_TTL_MINUTES: i64 = 15;

/// A pending enrollment
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentSession {
    pub id: String,
    pub user_id: String,
    pub biometric_type: BiometricType,
    pub started_at: DateTime<Utc>,
    pub samples: Vec<BiometricFeatureSet>,
}

impl EnrollmentSession {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.started_at > ttl
    }
}

/// Session-scoped storage for pending enrollments
#[derive(Debug, Clone)]
pub struct EnrollmentStore {
    sessions: HashMap<String, EnrollmentSession>,
    ttl: Duration,
}

impl Default for EnrollmentStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_ENROLLMENT_TTL_MINUTES))
    }
}

impl EnrollmentStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Open a session and return its id
    pub fn begin(
        &mut self,
        user_id: &str,
        biometric_type: BiometricType,
        now: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            EnrollmentSession {
                id: id.clone(),
                user_id: user_id.to_string(),
                biometric_type,
                started_at: now,
                samples: Vec::new(),
            },
        );
        id
    }

    /// Append a sample and return the session's sample count
    pub fn add_sample(
        &mut self,
        session_id: &str,
        sample: BiometricFeatureSet,
        now: DateTime<Utc>,
    ) -> Result<usize, ComputeError> {
        self.drop_if_expired(session_id, now);
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| ComputeError::EnrollmentSessionNotFound(session_id.to_string()))?;
        session.samples.push(sample);
        Ok(session.samples.len())
    }

    /// Peek at a live session
    pub fn get(&self, session_id: &str, now: DateTime<Utc>) -> Option<&EnrollmentSession> {
        self.sessions
            .get(session_id)
            .filter(|s| !s.is_expired(self.ttl, now))
    }

    /// Remove and return a live session
    pub fn take(
        &mut self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentSession, ComputeError> {
        self.drop_if_expired(session_id, now);
        self.sessions
            .remove(session_id)
            .ok_or_else(|| ComputeError::EnrollmentSessionNotFound(session_id.to_string()))
    }

    /// Drop every expired session and return how many were removed
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, s| !s.is_expired(ttl, now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn drop_if_expired(&mut self, session_id: &str, now: DateTime<Utc>) {
        let ttl = self.ttl;
        if self
            .sessions
            .get(session_id)
            .is_some_and(|s| s.is_expired(ttl, now))
        {
            self.sessions.remove(session_id);
        }
    }
}
