//! Capture ingestion schema
//!
//! This module defines the raw capture input accepted at the system boundary
//! and its normalization into `StrokeCollection`.

mod adapter;
mod capture;

pub use adapter::*;
pub use capture::*;
