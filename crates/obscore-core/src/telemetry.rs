// crates/obscore-core/src/telemetry.rs
// ============================================================================
// Module: Telemetry Data Model
// Description: The normalized record of one LLM call, and its failure variant.
// Purpose: The shape every agent's analytical component consumes as input.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! `TelemetryInput` is the agent fleet's lingua franca: a single normalized
//! record describing one LLM call, regardless of which upstream SDK produced
//! it. `FailureEvent` refines it for the failure classification agent, adding
//! the required `error` block present only when `status == Error`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identity::Provider;
use crate::identity::SpanId;
use crate::identity::TraceId;
use crate::timestamp::Timestamp;

/// Outcome status of the observed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallStatus {
    /// Call completed successfully.
    Ok,
    /// Call failed.
    Error,
    /// Status was not determined by the instrumentation.
    Unset,
}

/// Tagged sum over the shapes an LLM call's input may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallInput {
    /// Plain text completion input.
    Text {
        /// The raw prompt text.
        text: String,
    },
    /// Chat-style input: an ordered list of role/content messages.
    Chat {
        /// Ordered chat messages, each an opaque JSON object (role/content
        /// shape varies by provider and is not normalized further here).
        messages: Vec<Value>,
    },
    /// Multimodal input carrying arbitrary provider-specific parts.
    Multimodal {
        /// Ordered content parts, each an opaque JSON object.
        parts: Vec<Value>,
    },
}

/// Token usage counters. All fields are non-negative by construction
/// (`u64`); `total` is checked against `prompt + completion` by
/// [`TelemetryInput::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt (input) tokens.
    pub prompt: u64,
    /// Completion (output) tokens.
    pub completion: u64,
    /// Total tokens; must be >= `prompt + completion`.
    pub total: u64,
}

/// Cost attribution for the call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    /// Total cost in US dollars.
    pub amount_usd: f64,
    /// ISO 4217 currency code the amount was originally denominated in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    /// Prompt-attributable cost, if separable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_cost: Option<f64>,
    /// Completion-attributable cost, if separable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_cost: Option<f64>,
}

/// ISO 4217-ish currency code, carried as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(pub String);

/// Latency measurements for the call.
///
/// # Invariants
/// - `end_time >= start_time`, checked by [`TelemetryInput::validate`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Latency {
    /// Call start time, UTC.
    pub start_time: Timestamp,
    /// Call end time, UTC. Always >= `start_time`.
    pub end_time: Timestamp,
    /// Total wall-clock latency in milliseconds.
    pub total_ms: u64,
    /// Time to first token, if streaming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttft_ms: Option<u64>,
}

/// Caller-supplied context. Excluded from canonical hashing by default (see
/// [`crate::hashing::DEFAULT_EXCLUSIONS`]) since it carries no substantive
/// analytical signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Opaque end-user identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Opaque session identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Deployment environment, e.g. `production`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form key/value attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// A single ordered event within the call's lifetime (e.g. a retry, a
/// streaming chunk boundary). Carried opaquely; agents do not interpret
/// event contents beyond counting and ordering them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Event name.
    pub name: String,
    /// Event timestamp, UTC.
    pub timestamp: Timestamp,
    /// Opaque event attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// The normalized record of one LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryInput {
    /// Span identifier for this call.
    pub span_id: SpanId,
    /// Trace identifier grouping related spans.
    pub trace_id: TraceId,
    /// Parent span, if this call was nested within another.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    /// LLM provider.
    pub provider: Provider,
    /// Model identifier, e.g. `gpt-4o`.
    pub model: String,
    /// The call's input.
    pub input: CallInput,
    /// The call's output, if the call completed far enough to produce one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Token usage, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    /// Cost attribution, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
    /// Latency measurements.
    pub latency: Latency,
    /// Caller-supplied context.
    #[serde(default)]
    pub metadata: Metadata,
    /// Outcome status.
    pub status: CallStatus,
    /// Open, provider-specific attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Ordered lifecycle events.
    #[serde(default)]
    pub events: Vec<TelemetryEvent>,
}

impl TelemetryInput {
    /// Validates the structural invariants this type promises: `end_time >=
    /// start_time` and, when `total` is present, `total >= prompt +
    /// completion`.
    ///
    /// # Errors
    /// Returns a human-readable message naming the violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.latency.end_time < self.latency.start_time {
            return Err("latency.end_time must be >= latency.start_time".to_owned());
        }
        if let Some(usage) = self.token_usage {
            let implied = usage.prompt.saturating_add(usage.completion);
            if usage.total < implied {
                return Err(
                    "token_usage.total must be >= token_usage.prompt + token_usage.completion"
                        .to_owned(),
                );
            }
        }
        Ok(())
    }
}

/// Error detail required on a `TelemetryInput` whose `status == Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Provider-specific error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable error message.
    pub message: String,
    /// Error type/class, if distinguished from `code`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// HTTP status code, if the failure surfaced over HTTP. Must be in
    /// `[100, 599]` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Caller-suggested retry delay in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Raw upstream response body, opaque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
}

impl ErrorDetail {
    /// Validates `http_status` falls in `[100, 599]` when present.
    ///
    /// # Errors
    /// Returns a message naming the out-of-range value.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(status) = self.http_status {
            if !(100..=599).contains(&status) {
                return Err(format!("error.http_status {status} out of range [100, 599]"));
            }
        }
        Ok(())
    }
}

/// A `TelemetryInput` whose `status == Error`, carrying the required error
/// detail. The failure classification engine's sole input type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEvent {
    /// The underlying telemetry record. `status` is always `Error`.
    #[serde(flatten)]
    pub telemetry: TelemetryInput,
    /// Required error detail.
    pub error: ErrorDetail,
}

impl FailureEvent {
    /// Validates both the embedded telemetry invariants and the error
    /// detail's range checks, and that `status == Error`.
    ///
    /// # Errors
    /// Returns a message naming the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.telemetry.status, CallStatus::Error) {
            return Err("FailureEvent.status must be ERROR".to_owned());
        }
        self.telemetry.validate()?;
        self.error.validate()
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

    use super::CallInput;
    use super::CallStatus;
    use super::ErrorDetail;
    use super::FailureEvent;
    use super::Latency;
    use super::TelemetryInput;
    use crate::identity::Provider;
    use crate::identity::SpanId;
    use crate::identity::TraceId;
    use crate::timestamp::Timestamp;

    fn sample_telemetry(status: CallStatus) -> TelemetryInput {
        TelemetryInput {
            span_id: SpanId::new("span-1"),
            trace_id: TraceId::new("trace-1"),
            parent_span_id: None,
            provider: Provider::new("openai"),
            model: "gpt-4o".to_owned(),
            input: CallInput::Text { text: "hello".to_owned() },
            output: None,
            token_usage: None,
            cost: None,
            latency: Latency {
                start_time: Timestamp::parse("2026-07-27T10:00:00Z").expect("valid"),
                end_time: Timestamp::parse("2026-07-27T10:00:01Z").expect("valid"),
                total_ms: 1000,
                ttft_ms: None,
            },
            metadata: Default::default(),
            status,
            attributes: Default::default(),
            events: Vec::new(),
        }
    }

    #[test]
    fn rejects_end_before_start() {
        let mut telemetry = sample_telemetry(CallStatus::Ok);
        telemetry.latency.end_time = Timestamp::parse("2026-07-27T09:59:00Z").expect("valid");
        assert!(telemetry.validate().is_err());
    }

    #[test]
    fn failure_event_requires_error_status() {
        let telemetry = sample_telemetry(CallStatus::Ok);
        let event = FailureEvent {
            telemetry,
            error: ErrorDetail {
                code: None,
                message: "boom".to_owned(),
                error_type: None,
                http_status: Some(429),
                retry_after_ms: None,
                raw_response: None,
            },
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn failure_event_rejects_out_of_range_http_status() {
        let mut telemetry = sample_telemetry(CallStatus::Error);
        telemetry.status = CallStatus::Error;
        let event = FailureEvent {
            telemetry,
            error: ErrorDetail {
                code: None,
                message: "boom".to_owned(),
                error_type: None,
                http_status: Some(999),
                retry_after_ms: None,
                raw_response: None,
            },
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn chat_input_round_trips() {
        let input = CallInput::Chat { messages: vec![json!({"role": "user", "content": "hi"})] };
        let text = serde_json::to_string(&input).expect("serializes");
        assert!(text.contains("\"kind\":\"chat\""));
    }
}
