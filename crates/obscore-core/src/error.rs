// crates/obscore-core/src/error.rs
// ============================================================================
// Module: Agent Error Taxonomy
// Description: The stable error kinds shared by every pipeline stage.
// Purpose: Map internal failures to the wire error envelope and HTTP status.
// ============================================================================

//! ## Overview
//! Every fallible operation in the agent fleet ultimately resolves to one of
//! these kinds. Each carries a stable `code` string used both in structured
//! logs and in the `{success, error: {code, ...}}` response envelope. This
//! module defines the kind and its code only; HTTP status mapping lives with
//! the request pipeline, which is the only component that knows about HTTP.

use thiserror::Error;

/// Top-level error taxonomy for an observation agent request.
///
/// # Invariants
/// - `code()` is stable across releases; consumers may match on it.
/// - No variant carries a stack trace or internal path; messages are safe to
///   return to callers.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Input failed schema validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A disallowed operation was attempted or a DecisionEvent failed a
    /// structural invariant.
    #[error("constitutional violation: {0}")]
    ConstitutionalViolation(String),

    /// A per-request performance budget (latency or call count) was
    /// exceeded.
    #[error("performance boundary exceeded: {0}")]
    PerformanceBoundaryExceeded(String),

    /// The persistence gateway returned a non-retryable or exhausted-retry
    /// failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A request otherwise succeeded but emitted no `DecisionEvent`.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Canonical hashing failed (serialization error).
    #[error("hashing failed: {0}")]
    HashingFailed(String),

    /// Startup gating failed: a mandatory variable was absent or the gateway
    /// was unreachable.
    #[error("startup assertion failed: {0}")]
    StartupAssertionFailed(String),
}

impl AgentError {
    /// Returns the stable machine-readable code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::ConstitutionalViolation(_) => "constitutional_violation",
            Self::PerformanceBoundaryExceeded(_) => "performance_boundary_exceeded",
            Self::Persistence(_) => "persistence_error",
            Self::ContractViolation(_) => "contract_violation",
            Self::HashingFailed(_) => "hashing_failed",
            Self::StartupAssertionFailed(_) => "startup_assertion_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentError;

    #[test]
    fn code_is_stable_per_variant() {
        assert_eq!(AgentError::Validation("x".into()).code(), "validation_error");
        assert_eq!(
            AgentError::ConstitutionalViolation("x".into()).code(),
            "constitutional_violation"
        );
        assert_eq!(
            AgentError::PerformanceBoundaryExceeded("x".into()).code(),
            "performance_boundary_exceeded"
        );
        assert_eq!(AgentError::Persistence("x".into()).code(), "persistence_error");
        assert_eq!(AgentError::ContractViolation("x".into()).code(), "contract_violation");
        assert_eq!(AgentError::HashingFailed("x".into()).code(), "hashing_failed");
        assert_eq!(
            AgentError::StartupAssertionFailed("x".into()).code(),
            "startup_assertion_failed"
        );
    }
}
