// crates/obscore-core/src/decision.rs
// ============================================================================
// Module: Analysis Outputs and DecisionEvent
// Description: The agent-specific analysis output variants and the rigid
//              DecisionEvent provenance contract every agent writes exactly
//              one of, per request.
// Purpose: The output half of the data model; the only persisted artifact.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! `AnalysisOutput` is a tagged union: each agent kind produces exactly one
//! variant. `DecisionEvent` wraps a non-empty list of outputs with the
//! identity, hash, and constitutional fields every persisted record must
//! carry structurally, not just semantically — see [`DecisionEvent::validate`].

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identity::Cause;
use crate::identity::ExecutionRef;
use crate::identity::FailureCategory;
use crate::identity::Severity;
use crate::identity::SloId;
use crate::timestamp::Timestamp;

/// One condition that contributed to a classification or SLO result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// `"rule:<id>:<field>"` for classification signals.
    pub signal_type: String,
    /// Stringified observed value.
    pub signal_value: String,
    /// Contribution weight, `1 / condition_count`.
    pub weight: f64,
}

/// Result of the failure classification engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureClassification {
    /// Assigned failure category.
    pub category: FailureCategory,
    /// Assigned severity.
    pub severity: Severity,
    /// Assigned cause bucket.
    pub cause: Cause,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Per-condition signals.
    pub signals: Vec<Signal>,
    /// Rule ids that matched, in priority order. Empty when no rule matched.
    pub matched_rule_ids: Vec<String>,
    /// Advisory recommendation text. Never an actionable signal.
    pub recommendation: String,
    /// The span this classification was derived from.
    pub span_id: String,
}

/// One SLO violation or healthy/unknown status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SloStatusEntry {
    /// The SLO this status applies to.
    pub slo_id: SloId,
    /// `breached | warning | healthy | unknown`.
    pub status: String,
    /// Consecutive breach count, reset to 0 on non-breach.
    pub consecutive_breach_count: u32,
    /// Compliance percentage across available history, if computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_percentage: Option<f64>,
}

/// One concrete SLO violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SloViolation {
    /// The SLO that was violated.
    pub slo_id: SloId,
    /// `sla_breach | consecutive_breach | near_breach | slo_breach`.
    pub breach_type: String,
    /// Derived severity.
    pub severity: Severity,
    /// Signed, threshold-normalized deviation percentage.
    pub deviation_percentage: f64,
    /// Whether the violated SLO is a contractual SLA.
    pub is_sla: bool,
    /// SLA penalty tier, when `is_sla`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_penalty_tier: Option<u8>,
    /// Evaluator confidence in `[min_confidence, 1]`.
    pub confidence: f64,
}

/// Result of the SLO evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementResult {
    /// Concrete violations found.
    pub violations: Vec<SloViolation>,
    /// Status per evaluated SLO, including healthy/unknown ones.
    pub slo_statuses: Vec<SloStatusEntry>,
    /// Number of metric samples evaluated.
    pub metrics_evaluated: u64,
    /// Number of SLO definitions evaluated.
    pub slos_evaluated: u64,
    /// Wall-clock processing time for this evaluation.
    pub processing_time_ms: u64,
}

/// Result of the usage aggregator. Field shapes for nested structures
/// (`summary`, `time_series`, `distributions`, `provider_usage`, `trends`,
/// `seasonality`, `hotspots`, `growth_patterns`) are defined in
/// `obscore-engines::usage` and carried here as opaque JSON to keep this
/// crate free of the aggregator's internal statistics types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePatternAnalysis {
    /// Cardinality and rate summary.
    pub summary: Value,
    /// Per-bucket time series.
    pub time_series: Value,
    /// Latency/token/cost distributions.
    pub distributions: Value,
    /// Per-provider (nested per-model) usage breakdown.
    pub provider_usage: Value,
    /// Regression-based trends, when requested and sample size sufficed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<Value>,
    /// Hour/day/week seasonality, when requested and groups were present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<Value>,
    /// Top-5-per-dimension hotspots, sorted by intensity.
    pub hotspots: Value,
    /// Period-over-period and compound growth classification per metric.
    pub growth_patterns: Value,
    /// `1 - e^(-0.001 * n)` on sample size `n`.
    pub overall_confidence: f64,
    /// Number of events aggregated.
    pub sample_size: u64,
}

/// Result of the post-mortem synthesis agent. Narrative templating is an
/// external collaborator; this carries only the structured summary the
/// templater consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMortemReport {
    /// Incident summary.
    pub summary: String,
    /// Contributing failure classifications, by span id.
    pub contributing_spans: Vec<String>,
    /// Contributing SLO violations, by slo id.
    pub contributing_slo_ids: Vec<String>,
    /// Evaluator confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Result of the visualization spec emission agent. The target-language code
/// generator that turns this into renderable output is an external
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationSpec {
    /// Chart kind, e.g. `"time_series"`, `"histogram"`.
    pub chart_type: String,
    /// Opaque, validated request-derived spec body.
    pub spec: Value,
}

/// A tagged union over every agent-specific analytical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutput {
    /// Failure classification result.
    FailureClassification(FailureClassification),
    /// SLO enforcement result.
    EnforcementResult(EnforcementResult),
    /// Usage pattern analysis result.
    UsagePatternAnalysis(UsagePatternAnalysis),
    /// Post-mortem synthesis result.
    PostMortemReport(PostMortemReport),
    /// Visualization spec result.
    VisualizationSpec(VisualizationSpec),
}

/// The kind of reference an evidence entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceRefType {
    /// References a `span_id`.
    SpanId,
    /// References a `trace_id`.
    TraceId,
    /// References a log entry id.
    LogId,
    /// References a `metric_id`.
    MetricId,
    /// References something outside this data model.
    External,
}

/// One provenance pointer from a `DecisionEvent` back to its source data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// The kind of reference.
    pub ref_type: EvidenceRefType,
    /// The referenced value.
    pub ref_value: String,
    /// When the referenced evidence was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Where the referenced evidence originated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// The empty-list-only constraints field. Any non-empty deserialized value
/// is rejected by the schema validator before a `DecisionEvent` is ever
/// constructed; this type exists so the empty invariant is also enforced at
/// the Rust type level inside this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoConstraints;

/// The provenance record every agent writes exactly one of per successful
/// request.
///
/// # Invariants
/// - `constraints_applied` is structurally always `[]` (see
///   [`NoConstraints`] and [`DecisionEvent::validate`]).
/// - `phase == "phase1"`, `layer == "layer1"`.
/// - `outputs` is non-empty.
/// - `confidence` is in `[0, 1]`.
/// - `inputs_hash` is 64 lowercase hex characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Name of the agent that produced this event.
    pub source_agent: String,
    /// Domain the agent observes.
    pub domain: String,
    /// Constitutional phase literal, always `"phase1"`.
    pub phase: String,
    /// Constitutional layer literal, always `"layer1"`.
    pub layer: String,
    /// Process-scoped agent instance identifier.
    pub agent_id: String,
    /// Agent semantic version.
    pub agent_version: String,
    /// Agent-specific literal naming the kind of decision.
    pub decision_type: String,
    /// Free-form signal tag, e.g. `"failure_signal"`.
    pub event_type: String,
    /// 64 lowercase hex SHA-256 of the canonical request serialization.
    pub inputs_hash: String,
    /// Non-empty list of analysis outputs.
    pub outputs: Vec<AnalysisOutput>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Always the empty list, checked structurally.
    pub constraints_applied: Vec<NoConstraints>,
    /// Provenance pointers back to source data.
    pub evidence_refs: Vec<EvidenceRef>,
    /// Per-request unique identifier.
    pub execution_ref: ExecutionRef,
    /// UTC timestamp this event was constructed.
    pub timestamp: Timestamp,
}

impl DecisionEvent {
    /// Validates every structural invariant this type promises, beyond what
    /// the Rust type system already enforces (non-empty outputs, confidence
    /// range, literal fields, hash shape).
    ///
    /// # Errors
    /// Returns a message naming the first violated invariant.
    pub fn validate(&self, expected_decision_type: &str) -> Result<(), String> {
        if self.phase != "phase1" {
            return Err(format!("phase must be 'phase1', got '{}'", self.phase));
        }
        if self.layer != "layer1" {
            return Err(format!("layer must be 'layer1', got '{}'", self.layer));
        }
        if !self.constraints_applied.is_empty() {
            return Err("constraints_applied must be empty".to_owned());
        }
        if self.outputs.is_empty() {
            return Err("outputs must be non-empty".to_owned());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} out of range [0, 1]", self.confidence));
        }
        if self.inputs_hash.len() != 64
            || !self.inputs_hash.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return Err("inputs_hash must be 64 lowercase hex characters".to_owned());
        }
        if self.decision_type != expected_decision_type {
            return Err(format!(
                "decision_type '{}' does not match agent literal '{expected_decision_type}'",
                self.decision_type
            ));
        }
        Ok(())
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

    use super::AnalysisOutput;
    use super::Cause;
    use super::DecisionEvent;
    use super::FailureCategory;
    use super::FailureClassification;
    use super::Severity;
    use crate::identity::ExecutionRef;
    use crate::timestamp::Timestamp;

    fn sample_event(confidence: f64, inputs_hash: &str) -> DecisionEvent {
        DecisionEvent {
            source_agent: "failure-classifier".to_owned(),
            domain: "llm-gateway".to_owned(),
            phase: "phase1".to_owned(),
            layer: "layer1".to_owned(),
            agent_id: "failure-classifier-1".to_owned(),
            agent_version: "1.0.0".to_owned(),
            decision_type: "failure_classification".to_owned(),
            event_type: "failure_signal".to_owned(),
            inputs_hash: inputs_hash.to_owned(),
            outputs: vec![AnalysisOutput::FailureClassification(FailureClassification {
                category: FailureCategory::Unknown,
                severity: Severity::Informational,
                cause: Cause::Unknown,
                confidence: 0.0,
                signals: Vec::new(),
                matched_rule_ids: Vec::new(),
                recommendation: String::new(),
                span_id: "span-1".to_owned(),
            })],
            confidence,
            constraints_applied: Vec::new(),
            evidence_refs: Vec::new(),
            execution_ref: ExecutionRef::generate(),
            timestamp: Timestamp::parse("2026-07-27T10:00:00Z").expect("valid"),
        }
    }

    #[test]
    fn valid_event_passes() {
        let event = sample_event(0.0, &"a".repeat(64));
        assert!(event.validate("failure_classification").is_ok());
    }

    #[test]
    fn rejects_wrong_decision_type() {
        let event = sample_event(0.0, &"a".repeat(64));
        assert!(event.validate("slo_enforcement").is_err());
    }

    #[test]
    fn rejects_short_hash() {
        let event = sample_event(0.0, "abc");
        assert!(event.validate("failure_classification").is_err());
    }

    #[test]
    fn rejects_empty_outputs() {
        let mut event = sample_event(0.0, &"a".repeat(64));
        event.outputs.clear();
        assert!(event.validate("failure_classification").is_err());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let event = sample_event(1.5, &"a".repeat(64));
        assert!(event.validate("failure_classification").is_err());
    }
}
