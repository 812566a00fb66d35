// crates/obscore-contract/src/schemas.rs
// ============================================================================
// Module: Declared Input Schemas
// Description: The JSON Schema (draft 2020-12) representation backing every
//              validator in this crate.
// Purpose: Schema-as-data — the single source of truth the validator builds
//          from, and from which structural literal checks are derived.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Every schema here is `additionalProperties: false` at the top level
//! (strict mode, per the validator contract) and encodes literal fields
//! (`phase`, `layer`, `constraints_applied`, `decision_type`) as JSON Schema
//! `const`/`maxItems: 0` constraints so a wrong value is rejected by the
//! schema itself, not by a second pass of hand-written checks.

use serde_json::Value;
use serde_json::json;

/// Schema for a `FailureEvent`: a `TelemetryInput` with `status == "ERROR"`
/// and a required `error` block.
#[must_use]
pub fn failure_event() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "required": ["span_id", "trace_id", "provider", "model", "input", "latency", "status", "error"],
        "properties": {
            "span_id": { "type": "string", "minLength": 1 },
            "trace_id": { "type": "string", "minLength": 1 },
            "parent_span_id": { "type": "string" },
            "provider": { "type": "string", "minLength": 1 },
            "model": { "type": "string", "minLength": 1 },
            "input": { "type": "object" },
            "output": {},
            "token_usage": {
                "type": "object",
                "properties": {
                    "prompt": { "type": "integer", "minimum": 0 },
                    "completion": { "type": "integer", "minimum": 0 },
                    "total": { "type": "integer", "minimum": 0 }
                },
                "required": ["prompt", "completion", "total"]
            },
            "cost": { "type": "object" },
            "latency": {
                "type": "object",
                "required": ["start_time", "end_time", "total_ms"],
                "properties": {
                    "start_time": { "type": "string", "format": "date-time" },
                    "end_time": { "type": "string", "format": "date-time" },
                    "total_ms": { "type": "integer", "minimum": 0 },
                    "ttft_ms": { "type": "integer", "minimum": 0 }
                }
            },
            "metadata": { "type": "object" },
            "status": { "const": "ERROR" },
            "attributes": { "type": "object" },
            "events": { "type": "array" },
            "error": {
                "type": "object",
                "required": ["message"],
                "properties": {
                    "code": { "type": "string" },
                    "message": { "type": "string", "minLength": 1 },
                    "type": { "type": "string" },
                    "http_status": { "type": "integer", "minimum": 100, "maximum": 599 },
                    "retry_after_ms": { "type": "integer", "minimum": 0 },
                    "raw_response": {}
                }
            }
        }
    })
}

/// Schema for a batch of agent-specific input items.
#[must_use]
pub fn batch_request() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "required": ["items"],
        "properties": {
            "items": {
                "type": "array",
                "minItems": 1,
                "maxItems": 1000,
                "items": { "type": "object" }
            },
            "correlation_id": { "type": "string" },
            "fail_fast": { "type": "boolean" }
        }
    })
}

/// Schema for an SLO enforcement request.
#[must_use]
pub fn slo_enforcement_request() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "required": ["slo_definitions", "metrics"],
        "properties": {
            "slo_definitions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["slo_id", "name", "indicator", "operator", "threshold", "window", "is_sla"],
                    "properties": {
                        "slo_id": { "type": "string", "minLength": 1 },
                        "name": { "type": "string", "minLength": 1 },
                        "indicator": {
                            "enum": ["availability", "error_rate", "latency", "throughput", "cost"]
                        },
                        "operator": { "enum": ["lt", "lte", "gt", "gte", "eq", "neq"] },
                        "threshold": { "type": "number" },
                        "window": { "type": "string", "minLength": 1 },
                        "provider": { "type": "string" },
                        "model": { "type": "string" },
                        "environment": { "type": "string" },
                        "is_sla": { "type": "boolean" },
                        "sla_penalty_tier": { "type": "integer", "minimum": 1, "maximum": 5 },
                        "warning_threshold_percentage": { "type": "number", "minimum": 0, "maximum": 100 },
                        "enabled": { "type": "boolean" }
                    }
                }
            },
            "metrics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["metric_id", "indicator", "value", "window", "timestamp"],
                    "properties": {
                        "metric_id": { "type": "string", "format": "uuid" },
                        "indicator": {
                            "enum": ["availability", "error_rate", "latency", "throughput", "cost"]
                        },
                        "value": { "type": "number" },
                        "window": { "type": "string", "minLength": 1 },
                        "timestamp": { "type": "string", "format": "date-time" },
                        "sample_count": { "type": "integer", "minimum": 1 },
                        "provider": { "type": "string" },
                        "model": { "type": "string" },
                        "environment": { "type": "string" }
                    }
                }
            },
            "historical_context": { "type": "object" }
        }
    })
}

/// Schema for a usage-analysis request.
#[must_use]
pub fn analysis_request() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "required": ["events", "time_window"],
        "properties": {
            "events": { "type": "array", "items": { "type": "object" } },
            "time_window": {
                "type": "object",
                "required": ["start", "end", "granularity"],
                "properties": {
                    "start": { "type": "string", "format": "date-time" },
                    "end": { "type": "string", "format": "date-time" },
                    "granularity": { "enum": ["minute", "hour", "day", "week", "month"] }
                }
            },
            "filters": { "type": "object" },
            "options": { "type": "object" }
        }
    })
}

/// Schema for a visualization spec request.
#[must_use]
pub fn visualization_request() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "required": ["chart_type", "data_ref"],
        "properties": {
            "chart_type": { "type": "string", "minLength": 1 },
            "data_ref": { "type": "string", "minLength": 1 },
            "options": { "type": "object" }
        }
    })
}

/// Schema for a `DecisionEvent`, parameterized by the agent's literal
/// `decision_type` so each agent validates against its own contract.
#[must_use]
pub fn decision_event(decision_type_literal: &str) -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "required": [
            "source_agent", "domain", "phase", "layer", "agent_id", "agent_version",
            "decision_type", "event_type", "inputs_hash", "outputs", "confidence",
            "constraints_applied", "evidence_refs", "execution_ref", "timestamp"
        ],
        "properties": {
            "source_agent": { "type": "string", "minLength": 1 },
            "domain": { "type": "string", "minLength": 1 },
            "phase": { "const": "phase1" },
            "layer": { "const": "layer1" },
            "agent_id": { "type": "string", "minLength": 1 },
            "agent_version": { "type": "string", "pattern": "^\\d+\\.\\d+\\.\\d+$" },
            "decision_type": { "const": decision_type_literal },
            "event_type": { "type": "string", "minLength": 1 },
            "inputs_hash": { "type": "string", "pattern": "^[0-9a-f]{64}$" },
            "outputs": { "type": "array", "minItems": 1 },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            "constraints_applied": { "type": "array", "maxItems": 0 },
            "evidence_refs": { "type": "array" },
            "execution_ref": { "type": "string", "format": "uuid" },
            "timestamp": { "type": "string", "format": "date-time" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::decision_event;
    use super::failure_event;

    #[test]
    fn failure_event_pins_status_to_error() {
        let schema = failure_event();
        assert_eq!(schema["properties"]["status"]["const"], "ERROR");
    }

    #[test]
    fn decision_event_pins_literals_to_the_agent_decision_type() {
        let schema = decision_event("failure_classification");
        assert_eq!(schema["properties"]["phase"]["const"], "phase1");
        assert_eq!(schema["properties"]["layer"]["const"], "layer1");
        assert_eq!(schema["properties"]["decision_type"]["const"], "failure_classification");
        assert_eq!(schema["properties"]["constraints_applied"]["maxItems"], 0);
    }
}
