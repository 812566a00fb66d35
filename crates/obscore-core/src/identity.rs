// crates/obscore-core/src/identity.rs
// ============================================================================
// Module: Constitutional Types
// Description: Closed enum domains, identifiers, and the agent identity tuple.
// Purpose: Give every agent the same vocabulary for providers, failure
//          categories, severities, SLO indicators/operators, and the closed
//          set of operations an agent is constitutionally forbidden from
//          performing.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! An observation agent's identity is an immutable tuple fixed at process
//! startup. Every enum in this module is a closed domain shared across the
//! fleet; agent-specific behavior is expressed by which variants an agent's
//! rule tables or SLO definitions reference, never by extending the enums
//! themselves.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Agent Identity
// ============================================================================

/// Immutable identity tuple every agent is constructed with at startup.
///
/// # Invariants
/// - `phase` is always `"phase1"`, `layer` is always `"layer1"`.
/// - `agent_version` matches `^\d+\.\d+\.\d+$`; violated only via
///   [`AgentIdentity::new`] rejecting the input, never silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Human-readable agent name, e.g. `failure-classifier`.
    pub agent_name: AgentName,
    /// Domain the agent observes, e.g. `llm-gateway`.
    pub agent_domain: AgentDomain,
    /// Constitutional phase literal. Always `"phase1"`.
    pub phase: String,
    /// Constitutional layer literal. Always `"layer1"`.
    pub layer: String,
    /// Semantic version string matching `\d+\.\d+\.\d+`.
    pub agent_version: String,
}

impl AgentIdentity {
    /// Constructs an identity tuple, validating the version format.
    ///
    /// # Errors
    /// Returns an error message when `agent_version` does not match
    /// `^\d+\.\d+\.\d+$`.
    pub fn new(
        agent_name: AgentName,
        agent_domain: AgentDomain,
        agent_version: String,
    ) -> Result<Self, String> {
        if !is_semver_triple(&agent_version) {
            return Err(format!(
                "agent_version '{agent_version}' does not match ^\\d+\\.\\d+\\.\\d+$"
            ));
        }
        Ok(Self {
            agent_name,
            agent_domain,
            phase: "phase1".to_owned(),
            layer: "layer1".to_owned(),
            agent_version,
        })
    }
}

/// Validates `\d+\.\d+\.\d+` without pulling in a regex dependency for a
/// single fixed pattern.
fn is_semver_triple(value: &str) -> bool {
    let mut parts = value.split('.');
    let all_digits = |segment: &str| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(major), Some(minor), Some(patch), None) => {
            all_digits(major) && all_digits(minor) && all_digits(patch)
        }
        _ => false,
    }
}

// ============================================================================
// SECTION: String Identifiers
// ============================================================================

/// Agent name identifier, e.g. `failure-classifier`.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    /// Creates a new agent name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AgentName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AgentName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Domain an agent observes, e.g. `llm-gateway`.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentDomain(String);

impl AgentDomain {
    /// Creates a new agent domain.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AgentDomain {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AgentDomain {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Span identifier correlating a `TelemetryInput` to its originating call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(String);

impl SpanId {
    /// Creates a new span identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SpanId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SpanId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Trace identifier grouping related spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Creates a new trace identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TraceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Per-request unique identifier threading logs, response metadata, and the
/// persisted `DecisionEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionRef(Uuid);

impl ExecutionRef {
    /// Generates a fresh, random execution reference.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ExecutionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SLO definition identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SloId(String);

impl SloId {
    /// Creates a new SLO identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SloId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SloId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SloId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Metric sample identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(Uuid);

impl MetricId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Closed Enum Domains
// ============================================================================

/// The closed set of well-known provider identifiers. `Provider` accepts any
/// string on the wire; these constants are the ones the classification and
/// SLO engines may special-case.
pub const BUILTIN_PROVIDER_IDS: &[&str] =
    &["openai", "anthropic", "google", "azure_openai", "bedrock"];

/// Returns `true` if `id` is one of [`BUILTIN_PROVIDER_IDS`].
#[must_use]
pub fn is_builtin_provider_id(id: &str) -> bool {
    BUILTIN_PROVIDER_IDS.contains(&id)
}

/// LLM provider identifier: a closed set of well-known names plus an open
/// string for custom or self-hosted providers.
///
/// # Invariants
/// - Wire form is always the bare string; [`Provider::is_builtin`] tells a
///   caller whether it falls within [`BUILTIN_PROVIDER_IDS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provider(String);

impl Provider {
    /// Creates a new provider identifier from any string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the provider identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this provider is one of the well-known built-ins.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        is_builtin_provider_id(&self.0)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Provider {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Provider {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Failure category assigned by the classification engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Provider-side rate limiting.
    ProviderRateLimit,
    /// Provider returned a server-side error.
    ProviderServerError,
    /// Authentication or authorization failure.
    AuthFailure,
    /// Request failed input validation upstream of the agent.
    InvalidRequest,
    /// Call exceeded a timeout.
    Timeout,
    /// Content safety or moderation rejection.
    ContentFiltered,
    /// Could not be classified by any rule.
    Unknown,
}

impl FailureCategory {
    /// Returns the stable lowercase label for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProviderRateLimit => "provider_rate_limit",
            Self::ProviderServerError => "provider_server_error",
            Self::AuthFailure => "auth_failure",
            Self::InvalidRequest => "invalid_request",
            Self::Timeout => "timeout",
            Self::ContentFiltered => "content_filtered",
            Self::Unknown => "unknown",
        }
    }
}

/// Severity shared by the classification engine and the SLO evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Purely informational, no action implied.
    Informational,
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

impl Severity {
    /// Returns the stable lowercase label for this severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Classification "cause" bucket, orthogonal to category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    /// Caused by provider-side policy enforcement (e.g. rate limits).
    Policy,
    /// Caused by a transient infrastructure fault.
    Infrastructure,
    /// Caused by the caller's request shape.
    Client,
    /// Cause could not be determined.
    Unknown,
}

impl Cause {
    /// Returns the stable lowercase label for this cause.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Infrastructure => "infrastructure",
            Self::Client => "client",
            Self::Unknown => "unknown",
        }
    }
}

/// SLO indicator: the metric dimension an SLO is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SloIndicator {
    /// Fraction of successful calls.
    Availability,
    /// Fraction of calls resulting in an error.
    ErrorRate,
    /// Call latency.
    Latency,
    /// Requests served per unit time.
    Throughput,
    /// Cost per call or per unit time.
    Cost,
}

impl SloIndicator {
    /// Returns the stable lowercase label for this indicator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Availability => "availability",
            Self::ErrorRate => "error_rate",
            Self::Latency => "latency",
            Self::Throughput => "throughput",
            Self::Cost => "cost",
        }
    }
}

/// Comparison operator an SLO is evaluated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SloOperator {
    /// Breaches when the observed value is >= threshold.
    Lt,
    /// Breaches when the observed value is > threshold.
    Lte,
    /// Breaches when the observed value is <= threshold.
    Gt,
    /// Breaches when the observed value is < threshold.
    Gte,
    /// Breaches when the observed value differs from threshold.
    Eq,
    /// Breaches when the observed value equals threshold.
    Neq,
}

impl SloOperator {
    /// Returns the stable lowercase label for this operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Eq => "eq",
            Self::Neq => "neq",
        }
    }

    /// Returns `true` if this operator expresses an upper bound (breaching
    /// above threshold rather than below it).
    #[must_use]
    pub const fn is_upper_bound(self) -> bool {
        matches!(self, Self::Lt | Self::Lte)
    }
}

/// The closed set of operations an agent is constitutionally forbidden from
/// performing. Referenced by documentation and tests, never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProhibitedOperation {
    /// Mutating any upstream system state.
    UpstreamMutation,
    /// Triggering remediation actions.
    Remediation,
    /// Sending alerts or notifications.
    Alerting,
    /// Mutating policy.
    PolicyMutation,
    /// Performing direct database I/O outside the persistence gateway.
    DirectDatabaseIo,
    /// Coordinating with another agent's in-flight request.
    InterAgentCoordination,
}

impl ProhibitedOperation {
    /// Returns every member of the closed set.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::UpstreamMutation,
            Self::Remediation,
            Self::Alerting,
            Self::PolicyMutation,
            Self::DirectDatabaseIo,
            Self::InterAgentCoordination,
        ]
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

    use super::AgentDomain;
    use super::AgentIdentity;
    use super::AgentName;
    use super::ProhibitedOperation;
    use super::Provider;
    use super::SloOperator;

    #[test]
    fn identity_accepts_semver_triple() {
        let identity = AgentIdentity::new(
            AgentName::new("failure-classifier"),
            AgentDomain::new("llm-gateway"),
            "1.4.2".to_owned(),
        )
        .expect("valid version");
        assert_eq!(identity.phase, "phase1");
        assert_eq!(identity.layer, "layer1");
    }

    #[test]
    fn identity_rejects_malformed_version() {
        let err = AgentIdentity::new(
            AgentName::new("failure-classifier"),
            AgentDomain::new("llm-gateway"),
            "1.4".to_owned(),
        )
        .unwrap_err();
        assert!(err.contains("agent_version"));
    }

    #[test]
    fn custom_provider_round_trips_as_string() {
        let provider = Provider::new("self-hosted-llama");
        let json = serde_json::to_string(&provider).expect("serializes");
        assert_eq!(json, "\"self-hosted-llama\"");
        assert!(!provider.is_builtin());
        assert!(Provider::new("openai").is_builtin());
    }

    #[test]
    fn prohibited_operations_are_six() {
        assert_eq!(ProhibitedOperation::all().len(), 6);
    }

    #[test]
    fn upper_bound_operators_are_lt_and_lte() {
        assert!(SloOperator::Lt.is_upper_bound());
        assert!(SloOperator::Lte.is_upper_bound());
        assert!(!SloOperator::Gt.is_upper_bound());
        assert!(!SloOperator::Gte.is_upper_bound());
    }
}
