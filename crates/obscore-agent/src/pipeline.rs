// crates/obscore-agent/src/pipeline.rs
// ============================================================================
// Module: Request Pipeline
// Description: The shared stage sequence every route handler drives:
//              Received -> Validated -> Guarded -> Analyzed -> DecisionBuilt
//              -> Persisted -> Responded, or Aborted(reason) at any stage.
// Purpose: One place builds, validates, and persists a DecisionEvent so no
//          route hand-rolls hashing, guard checks, or the contract ledger.
// Dependencies: obscore-contract, obscore-core, obscore-gateway, serde_json,
//               time, tracing
// ============================================================================

//! ## Overview
//! Every route follows the same shape once it has a validated request body
//! and an [`obscore_core::decision::AnalysisOutput`] in hand: hash the
//! canonical input, mint an `execution_ref`, build one `DecisionEvent`,
//! validate it against the schema pinned to this process's `decision_type`,
//! persist it through the gateway, and record the emission. This module
//! supplies that shared second half; each route owns only the first half —
//! parsing its own request shape and invoking its own engine.

use obscore_core::contract::ContractLedger;
use obscore_core::decision::AnalysisOutput;
use obscore_core::decision::DecisionEvent;
use obscore_core::decision::EvidenceRef;
use obscore_core::decision::NoConstraints;
use obscore_core::error::AgentError;
use obscore_core::guard::PerformanceGuard;
use obscore_core::hashing;
use obscore_core::identity::ExecutionRef;
use obscore_core::timestamp::Timestamp;
use serde_json::Value;

use crate::error::PipelineError;
use crate::state::AppState;

/// Everything assembled for one request as it moves through the pipeline
/// stages. Constructed once per request; never shared across requests.
pub struct RequestContext {
    /// Per-request latency/call-count guard.
    pub guard: PerformanceGuard,
    /// Per-request emission ledger.
    pub ledger: ContractLedger,
    /// This request's unique execution reference.
    pub execution_ref: ExecutionRef,
}

impl RequestContext {
    /// Starts a new request: begins the latency clock and mints the
    /// execution reference. This is the pipeline's `Received` stage.
    #[must_use]
    pub fn start(state: &AppState) -> Self {
        Self {
            guard: PerformanceGuard::new(state.config.limits.max_latency_ms, state.config.limits.max_calls_per_run),
            ledger: ContractLedger::new(),
            execution_ref: ExecutionRef::generate(),
        }
    }

    /// `Guarded`: asserts the latency budget has not yet elapsed.
    ///
    /// # Errors
    /// Returns [`PipelineError`] mapping to a `504` when the budget has
    /// elapsed.
    pub fn assert_latency(&self) -> Result<(), PipelineError> {
        self.guard
            .assert_latency_limit()
            .map_err(|err| PipelineError::Agent(AgentError::PerformanceBoundaryExceeded(err.to_string())))
    }

    /// `Guarded`: asserts one more outbound call would not exceed the call
    /// budget, then records it. Call immediately before the gateway call it
    /// guards.
    ///
    /// # Errors
    /// Returns [`PipelineError`] mapping to a `504` once the budget is
    /// exhausted.
    pub fn assert_call_budget(&mut self) -> Result<(), PipelineError> {
        self.guard
            .assert_call_limit()
            .map_err(|err| PipelineError::Agent(AgentError::PerformanceBoundaryExceeded(err.to_string())))
    }
}

/// `DecisionBuilt`: hashes the canonical request input and assembles one
/// `DecisionEvent`, stamped with this process's identity and the given
/// output, confidence, and evidence.
///
/// # Errors
/// Returns [`PipelineError::Agent`] wrapping [`AgentError::HashingFailed`]
/// if the input cannot be canonicalized.
pub fn build_decision_event(
    state: &AppState,
    ctx: &RequestContext,
    input: &Value,
    output: AnalysisOutput,
    confidence: f64,
    evidence_refs: Vec<EvidenceRef>,
) -> Result<DecisionEvent, PipelineError> {
    let inputs_hash = hashing::hash(input)
        .map_err(|err| PipelineError::Agent(AgentError::HashingFailed(err.to_string())))?;

    Ok(DecisionEvent {
        source_agent: state.identity.agent_name.as_str().to_owned(),
        domain: state.identity.agent_domain.as_str().to_owned(),
        phase: state.identity.phase.clone(),
        layer: state.identity.layer.clone(),
        agent_id: state.agent_id.clone(),
        agent_version: state.identity.agent_version.clone(),
        decision_type: state.kind.decision_type().to_owned(),
        event_type: state.kind.event_type().to_owned(),
        inputs_hash: inputs_hash.value,
        outputs: vec![output],
        confidence,
        constraints_applied: Vec::<NoConstraints>::new(),
        evidence_refs,
        execution_ref: ctx.execution_ref,
        timestamp: Timestamp::new(
            time::OffsetDateTime::now_utc(),
        ),
    })
}

/// `Analyzed` -> `DecisionBuilt`: validates the assembled event's
/// structural invariants and against the schema pinned to this process's
/// `decision_type`. Raised violations indicate a bug in this process, never
/// a caller error — a correctly-built event always passes its own schema.
///
/// # Errors
/// Returns [`PipelineError::Agent`] wrapping
/// [`AgentError::ContractViolation`] when either check fails.
pub fn validate_decision_event(state: &AppState, event: &DecisionEvent) -> Result<(), PipelineError> {
    event
        .validate(state.kind.decision_type())
        .map_err(|err| PipelineError::Agent(AgentError::ContractViolation(err)))?;

    let value = serde_json::to_value(event)
        .map_err(|err| PipelineError::Agent(AgentError::ContractViolation(err.to_string())))?;
    state
        .decision_validator
        .validate(&value)
        .map_err(|err| PipelineError::Agent(AgentError::ContractViolation(err.to_string())))
}

/// `Persisted`: sends the event through the gateway, under the call-count
/// guard, and records the emission in the request's contract ledger.
///
/// # Errors
/// Returns [`PipelineError::Gateway`] on a persistence failure, or
/// [`PipelineError::Agent`] wrapping [`AgentError::PerformanceBoundaryExceeded`]
/// if the call budget is already exhausted.
pub async fn persist(
    state: &AppState,
    ctx: &mut RequestContext,
    event: &DecisionEvent,
) -> Result<(), PipelineError> {
    ctx.assert_call_budget()?;
    state.gateway.persist_decision(event).await?;
    ctx.ledger.record_emission();
    Ok(())
}

/// `Responded`: asserts the contract ledger recorded at least one emission
/// before the pipeline reports success. Call this last, immediately before
/// building the success response.
///
/// # Errors
/// Returns [`PipelineError::Agent`] wrapping
/// [`AgentError::ContractViolation`] if no emission was recorded —
/// `Aborted` is always reached by returning an error earlier, so this
/// should never trip in practice.
pub fn assert_responded(ctx: &RequestContext) -> Result<(), PipelineError> {
    ctx.ledger
        .assert_contracts_met()
        .map_err(|err| PipelineError::Agent(AgentError::ContractViolation(err.to_string())))
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

    use obscore_core::decision::AnalysisOutput;
    use obscore_core::decision::FailureClassification;
    use obscore_core::identity::Cause;
    use obscore_core::identity::FailureCategory;
    use obscore_core::identity::Severity;
    use serde_json::json;

    use super::build_decision_event;
    use super::validate_decision_event;
    use super::RequestContext;
    use crate::kind::AgentKind;
    use crate::state::AppState;

    fn sample_state() -> AppState {
        use std::collections::BTreeMap;

        use obscore_core::startup::Config as StartupConfig;

        let mut vars = BTreeMap::new();
        vars.insert("RUVECTOR_SERVICE_URL".to_owned(), "https://gateway.internal".to_owned());
        vars.insert("RUVECTOR_API_KEY".to_owned(), "secret".to_owned());
        vars.insert("AGENT_NAME".to_owned(), "failure-classifier".to_owned());
        vars.insert("AGENT_DOMAIN".to_owned(), "llm-gateway".to_owned());
        vars.insert("AGENT_PHASE".to_owned(), "phase1".to_owned());
        vars.insert("AGENT_LAYER".to_owned(), "layer1".to_owned());
        let config = StartupConfig::from_merged_vars(&vars).expect("valid config");
        AppState::build(config, AgentKind::Classification, crate::rules::default_rules()).expect("state builds")
    }

    fn sample_output() -> AnalysisOutput {
        AnalysisOutput::FailureClassification(FailureClassification {
            category: FailureCategory::Unknown,
            severity: Severity::Informational,
            cause: Cause::Unknown,
            confidence: 0.0,
            signals: Vec::new(),
            matched_rule_ids: Vec::new(),
            recommendation: String::new(),
            span_id: "span-1".to_owned(),
        })
    }

    #[test]
    fn built_event_passes_its_own_validation() {
        let state = sample_state();
        let ctx = RequestContext::start(&state);
        let input = json!({"span_id": "span-1"});
        let event = build_decision_event(&state, &ctx, &input, sample_output(), 0.0, Vec::new())
            .expect("builds");
        validate_decision_event(&state, &event).expect("passes its own schema");
    }

    #[test]
    fn hash_is_stable_for_identical_input() {
        let state = sample_state();
        let ctx = RequestContext::start(&state);
        let input = json!({"span_id": "span-1"});
        let first = build_decision_event(&state, &ctx, &input, sample_output(), 0.0, Vec::new()).expect("builds");
        let second = build_decision_event(&state, &ctx, &input, sample_output(), 0.0, Vec::new()).expect("builds");
        assert_eq!(first.inputs_hash, second.inputs_hash);
    }
}
