// crates/obscore-agent/src/rules.rs
// ============================================================================
// Module: Classification Rule Table
// Description: The declarative, data-driven rule set the classification
//              engine is built from — loaded from the optional TOML overlay,
//              falling back to a small compiled-in default table.
// Purpose: Keep the rule set swappable by data rather than by code, per the
//          classification engine's table-driven design.
// Dependencies: obscore-engines, serde, toml
// ============================================================================

//! ## Overview
//! The classification engine takes a `Vec<ClassificationRule>` and never
//! reads configuration itself. This module is the one place that knows how
//! to load that table from data: an optional `[[classification_rules]]`
//! array-of-tables in the file at `AGENT_CONFIG_PATH`, or — when that file or
//! section is absent — [`default_rules`].

use obscore_engines::ClassificationRule;
use obscore_engines::Condition;
use obscore_engines::ConditionOperator;
use obscore_engines::RuleOutput;
use obscore_core::identity::Cause;
use obscore_core::identity::FailureCategory;
use obscore_core::identity::Severity;
use serde::Deserialize;
use serde_json::Value;

/// TOML-shaped view of one rule, convertible into a
/// [`ClassificationRule`] once deserialized.
#[derive(Debug, Deserialize)]
pub struct RuleSpec {
    id: String,
    priority: i32,
    confidence_base: f64,
    #[serde(default)]
    conditions: Vec<ConditionSpec>,
    output: OutputSpec,
}

#[derive(Debug, Deserialize)]
struct ConditionSpec {
    field: String,
    operator: String,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct OutputSpec {
    category: String,
    severity: String,
    cause: String,
}

/// Raised when a rule spec names an operator, category, severity, or cause
/// outside the closed vocabulary.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unrecognized classification rule field value: {0}")]
pub struct RuleSpecError(pub String);

impl RuleSpec {
    fn into_rule(self) -> Result<ClassificationRule, RuleSpecError> {
        let conditions = self
            .conditions
            .into_iter()
            .map(ConditionSpec::into_condition)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ClassificationRule {
            id: self.id,
            priority: self.priority,
            confidence_base: self.confidence_base,
            conditions,
            output: self.output.into_output()?,
        })
    }
}

impl ConditionSpec {
    fn into_condition(self) -> Result<Condition, RuleSpecError> {
        let operator = match self.operator.as_str() {
            "equals" => ConditionOperator::Equals,
            "contains" => ConditionOperator::Contains,
            "matches" => ConditionOperator::Matches,
            "in" => ConditionOperator::In,
            "gt" => ConditionOperator::Gt,
            "lt" => ConditionOperator::Lt,
            "gte" => ConditionOperator::Gte,
            "lte" => ConditionOperator::Lte,
            other => return Err(RuleSpecError(format!("condition operator '{other}'"))),
        };
        Ok(Condition { field: self.field, operator, value: self.value })
    }
}

impl OutputSpec {
    fn into_output(self) -> Result<RuleOutput, RuleSpecError> {
        let category = match self.category.as_str() {
            "provider_rate_limit" => FailureCategory::ProviderRateLimit,
            "provider_server_error" => FailureCategory::ProviderServerError,
            "auth_failure" => FailureCategory::AuthFailure,
            "invalid_request" => FailureCategory::InvalidRequest,
            "timeout" => FailureCategory::Timeout,
            "content_filtered" => FailureCategory::ContentFiltered,
            "unknown" => FailureCategory::Unknown,
            other => return Err(RuleSpecError(format!("category '{other}'"))),
        };
        let severity = match self.severity.as_str() {
            "informational" => Severity::Informational,
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            other => return Err(RuleSpecError(format!("severity '{other}'"))),
        };
        let cause = match self.cause.as_str() {
            "policy" => Cause::Policy,
            "infrastructure" => Cause::Infrastructure,
            "client" => Cause::Client,
            "unknown" => Cause::Unknown,
            other => return Err(RuleSpecError(format!("cause '{other}'"))),
        };
        Ok(RuleOutput { category, severity, cause })
    }
}

/// Converts a file-supplied rule table into engine rules, or names the first
/// field that fails to resolve to a closed vocabulary value.
///
/// # Errors
/// Returns [`RuleSpecError`] if any rule names an unrecognized operator,
/// category, severity, or cause.
pub fn rules_from_specs(specs: Vec<RuleSpec>) -> Result<Vec<ClassificationRule>, RuleSpecError> {
    specs.into_iter().map(RuleSpec::into_rule).collect()
}

/// The compiled-in rule table used when the configuration file carries no
/// `[[classification_rules]]` section. Covers the failure categories the
/// data model names, one rule each, ordered by the same priority a
/// hand-tuned production table would use (auth and rate limiting ahead of
/// generic server errors).
#[must_use]
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            id: "default_rate_limit".to_owned(),
            priority: 100,
            confidence_base: 0.95,
            conditions: vec![Condition {
                field: "error.http_status".to_owned(),
                operator: ConditionOperator::Equals,
                value: Value::from(429),
            }],
            output: RuleOutput {
                category: FailureCategory::ProviderRateLimit,
                severity: Severity::Medium,
                cause: Cause::Policy,
            },
        },
        ClassificationRule {
            id: "default_auth_failure".to_owned(),
            priority: 90,
            confidence_base: 0.9,
            conditions: vec![Condition {
                field: "error.http_status".to_owned(),
                operator: ConditionOperator::In,
                value: Value::from(vec![Value::from(401), Value::from(403)]),
            }],
            output: RuleOutput {
                category: FailureCategory::AuthFailure,
                severity: Severity::High,
                cause: Cause::Client,
            },
        },
        ClassificationRule {
            id: "default_content_filtered".to_owned(),
            priority: 80,
            confidence_base: 0.85,
            conditions: vec![Condition {
                field: "error.message".to_owned(),
                operator: ConditionOperator::Contains,
                value: Value::from("content"),
            }],
            output: RuleOutput {
                category: FailureCategory::ContentFiltered,
                severity: Severity::Low,
                cause: Cause::Policy,
            },
        },
        ClassificationRule {
            id: "default_timeout".to_owned(),
            priority: 70,
            confidence_base: 0.85,
            conditions: vec![Condition {
                field: "error.message".to_owned(),
                operator: ConditionOperator::Contains,
                value: Value::from("timeout"),
            }],
            output: RuleOutput {
                category: FailureCategory::Timeout,
                severity: Severity::Medium,
                cause: Cause::Infrastructure,
            },
        },
        ClassificationRule {
            id: "default_invalid_request".to_owned(),
            priority: 60,
            confidence_base: 0.8,
            conditions: vec![Condition {
                field: "error.http_status".to_owned(),
                operator: ConditionOperator::Equals,
                value: Value::from(400),
            }],
            output: RuleOutput {
                category: FailureCategory::InvalidRequest,
                severity: Severity::Low,
                cause: Cause::Client,
            },
        },
        ClassificationRule {
            id: "default_server_error".to_owned(),
            priority: 50,
            confidence_base: 0.75,
            conditions: vec![Condition {
                field: "error.http_status".to_owned(),
                operator: ConditionOperator::Gte,
                value: Value::from(500),
            }],
            output: RuleOutput {
                category: FailureCategory::ProviderServerError,
                severity: Severity::High,
                cause: Cause::Infrastructure,
            },
        },
    ]
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

    use super::default_rules;
    use super::rules_from_specs;
    use super::RuleSpec;

    #[test]
    fn default_rules_are_non_empty_and_priority_ordered_descending() {
        let rules = default_rules();
        assert!(!rules.is_empty());
        for window in rules.windows(2) {
            assert!(window[0].priority >= window[1].priority);
        }
    }

    #[test]
    fn file_rules_parse_from_toml() {
        let toml_text = r#"
            [[classification_rules]]
            id = "custom_429"
            priority = 200
            confidence_base = 0.99

            [[classification_rules.conditions]]
            field = "error.http_status"
            operator = "equals"
            value = 429

            [classification_rules.output]
            category = "provider_rate_limit"
            severity = "medium"
            cause = "policy"
        "#;
        #[derive(serde::Deserialize)]
        struct Wrapper {
            classification_rules: Vec<RuleSpec>,
        }
        let wrapper: Wrapper = toml::from_str(toml_text).expect("valid toml");
        let rules = rules_from_specs(wrapper.classification_rules).expect("valid rule vocabulary");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "custom_429");
    }

    #[test]
    fn unrecognized_operator_is_rejected() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            classification_rules: Vec<RuleSpec>,
        }
        let toml_text = r#"
            [[classification_rules]]
            id = "bad"
            priority = 1
            confidence_base = 0.5

            [[classification_rules.conditions]]
            field = "x"
            operator = "startswith"
            value = "y"

            [classification_rules.output]
            category = "unknown"
            severity = "low"
            cause = "unknown"
        "#;
        let wrapper: Wrapper = toml::from_str(toml_text).expect("valid toml");
        assert!(rules_from_specs(wrapper.classification_rules).is_err());
    }
}
