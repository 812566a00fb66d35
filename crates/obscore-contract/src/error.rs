// crates/obscore-contract/src/error.rs
// ============================================================================
// Module: Validation Error Shape
// Description: The structured, caller-facing representation of a schema
//              violation.
// Purpose: Every validator in this crate returns the same error shape
//          regardless of which schema rejected the input.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// One field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON Pointer-style path to the offending value, e.g. `/latency/total_ms`.
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// What the schema required, when expressible as a short string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// What was actually supplied, when expressible as a short string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Stable machine-readable classification of the violation.
    pub code: String,
}

/// Raised when an input fails schema validation. Carries every violation
/// found, not just the first.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("schema validation failed with {} violation(s)", .violations.len())]
pub struct ValidationError {
    /// Every violation found, in schema traversal order.
    pub violations: Vec<FieldError>,
}

impl ValidationError {
    /// Builds a validation error from a non-empty list of violations.
    #[must_use]
    pub const fn new(violations: Vec<FieldError>) -> Self {
        Self { violations }
    }
}
