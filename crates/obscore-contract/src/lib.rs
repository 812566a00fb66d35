// crates/obscore-contract/src/lib.rs
// ============================================================================
// Crate: obscore-contract
// Description: Declared input/output schemas and the strict validator that
//              checks instances against them.
// Purpose: One crate, one job — reject malformed input before any analytical
//          code runs, and reject malformed output before it is persisted.
// Dependencies: jsonschema, obscore-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every request an agent accepts, and every `DecisionEvent` it emits,
//! passes through a [`SchemaValidator`] compiled from one of the schemas in
//! [`schemas`]. Validation is strict: unknown top-level fields are rejected,
//! and literal fields (`phase`, `layer`, `constraints_applied`,
//! `decision_type`) are enforced structurally by the schema itself rather
//! than by a second pass of hand-written checks.

#![forbid(unsafe_code)]

pub mod error;
pub mod schemas;
pub mod validator;

pub use error::FieldError;
pub use error::ValidationError;
pub use validator::SchemaCompileError;
pub use validator::SchemaValidator;

/// The full set of request-shape validators an agent needs, compiled once
/// at startup.
pub struct RequestValidators {
    /// Validates `FailureEvent` input.
    pub failure_event: SchemaValidator,
    /// Validates `BatchRequest` input.
    pub batch_request: SchemaValidator,
    /// Validates `SloEnforcementRequest` input.
    pub slo_enforcement_request: SchemaValidator,
    /// Validates `AnalysisRequest` input.
    pub analysis_request: SchemaValidator,
    /// Validates `VisualizationRequest` input.
    pub visualization_request: SchemaValidator,
}

impl RequestValidators {
    /// Compiles every declared request schema.
    ///
    /// # Errors
    /// Returns [`SchemaCompileError`] if any schema literal in this crate is
    /// itself malformed — a defect in this crate, never in caller input.
    pub fn compile() -> Result<Self, SchemaCompileError> {
        Ok(Self {
            failure_event: SchemaValidator::compile(&schemas::failure_event())?,
            batch_request: SchemaValidator::compile(&schemas::batch_request())?,
            slo_enforcement_request: SchemaValidator::compile(&schemas::slo_enforcement_request())?,
            analysis_request: SchemaValidator::compile(&schemas::analysis_request())?,
            visualization_request: SchemaValidator::compile(&schemas::visualization_request())?,
        })
    }
}

/// Validates a `DecisionEvent` against a specific agent's `decision_type`.
/// Compiled per agent identity, since the literal varies per agent.
pub struct DecisionEventValidator {
    inner: SchemaValidator,
}

impl DecisionEventValidator {
    /// Compiles a `DecisionEvent` schema pinned to `decision_type`.
    ///
    /// # Errors
    /// Returns [`SchemaCompileError`] if the generated schema fails to
    /// compile.
    pub fn for_decision_type(decision_type: &str) -> Result<Self, SchemaCompileError> {
        let inner = SchemaValidator::compile(&schemas::decision_event(decision_type))?;
        Ok(Self { inner })
    }

    /// Validates a candidate `DecisionEvent` payload.
    ///
    /// # Errors
    /// Returns [`ValidationError`] carrying every violation found.
    pub fn validate(&self, instance: &serde_json::Value) -> Result<(), ValidationError> {
        self.inner.validate(instance)
    }
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use serde_json::json;

    use super::DecisionEventValidator;
    use super::RequestValidators;

    #[test]
    fn all_request_schemas_compile() {
        RequestValidators::compile().expect("all declared schemas compile");
    }

    #[test]
    fn decision_event_validator_rejects_wrong_decision_type() {
        let validator = DecisionEventValidator::for_decision_type("failure_classification")
            .expect("schema compiles");
        let payload = json!({
            "source_agent": "failure-classifier",
            "domain": "llm-gateway",
            "phase": "phase1",
            "layer": "layer1",
            "agent_id": "agent-1",
            "agent_version": "0.1.0",
            "decision_type": "slo_enforcement",
            "event_type": "classification.completed",
            "inputs_hash": "a".repeat(64),
            "outputs": [{}],
            "confidence": 0.9,
            "constraints_applied": [],
            "evidence_refs": [],
            "execution_ref": "5f3c7b1e-9b2a-4f1a-8f3a-2b9f0c7d6e5a",
            "timestamp": "2026-01-01T00:00:00Z"
        });
        let err = validator.validate(&payload).expect_err("wrong decision_type");
        assert!(err.violations.iter().any(|violation| violation.code == "const_mismatch"));
    }
}
