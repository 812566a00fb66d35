// crates/obscore-engines/src/classification.rs
// ============================================================================
// Module: Classification Engine
// Description: Priority-sorted rule table that maps a failure event onto a
//              (category, severity, cause) triple with confidence and
//              signal evidence.
// Purpose: Deterministic, table-driven failure classification — the rule
//          set is data, not a chain of conditionals.
// Dependencies: bigdecimal, obscore-core, regex, serde_json
// ============================================================================

//! ## Overview
//! Rules are sorted once, by descending priority, at
//! [`ClassificationEngine::new`] time; ties keep their original relative
//! order (`sort_by` is stable), matching the insertion-order tie-break.
//! [`ClassificationEngine::classify`] walks the sorted table and returns the
//! first rule whose conditions are *all* satisfied — no further rules are
//! considered once one matches.

use bigdecimal::BigDecimal;
use obscore_core::decision::FailureClassification;
use obscore_core::decision::Signal;
use obscore_core::identity::Cause;
use obscore_core::identity::FailureCategory;
use obscore_core::identity::Severity;
use regex::RegexBuilder;
use serde_json::Value;

/// A single condition within a rule: a dotted-path field, an operator, and
/// the value it is compared against.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Dotted path into the telemetry value, e.g. `error.http_status`.
    pub field: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// The value the observed field is compared against.
    pub value: Value,
}

/// Operators a [`Condition`] may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    /// Observed value equals the target (case-sensitive, type-coercing).
    Equals,
    /// Observed value's string form contains the target's, case-insensitive.
    Contains,
    /// Observed value's string form matches the target regex, case-insensitive.
    Matches,
    /// Observed value is one of the target array's elements.
    In,
    /// Observed numeric value is strictly greater than the target.
    Gt,
    /// Observed numeric value is strictly less than the target.
    Lt,
    /// Observed numeric value is greater than or equal to the target.
    Gte,
    /// Observed numeric value is less than or equal to the target.
    Lte,
}

/// The `(category, severity, cause)` a matching rule assigns.
#[derive(Debug, Clone)]
pub struct RuleOutput {
    /// Failure category.
    pub category: FailureCategory,
    /// Severity.
    pub severity: Severity,
    /// Cause.
    pub cause: Cause,
}

/// One row of the classification rule table.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    /// Stable rule identifier, reported in `matched_rule_ids`.
    pub id: String,
    /// Evaluation priority; higher runs first.
    pub priority: i32,
    /// Base confidence assigned when every condition matches.
    pub confidence_base: f64,
    /// Conditions which must all hold for this rule to match.
    pub conditions: Vec<Condition>,
    /// The classification this rule assigns when matched.
    pub output: RuleOutput,
}

/// A priority-sorted, table-driven failure classifier.
///
/// # Invariants
/// - Rules are sorted once, by descending priority, at construction.
/// - Evaluation is deterministic and stateless: the same input and rule
///   table always produce the same classification.
pub struct ClassificationEngine {
    rules: Vec<ClassificationRule>,
}

impl ClassificationEngine {
    /// Builds an engine from an unsorted rule table, sorting once by
    /// descending priority (stable, so ties preserve insertion order).
    #[must_use]
    pub fn new(mut rules: Vec<ClassificationRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    /// Classifies a failure event, represented as its JSON value (typically
    /// a serialized `FailureEvent`).
    #[must_use]
    pub fn classify(&self, event: &Value) -> FailureClassification {
        let span_id = event.get("span_id").and_then(Value::as_str).unwrap_or_default().to_owned();

        for rule in &self.rules {
            let total = rule.conditions.len();
            // An empty condition list is vacuously satisfied: this rule wins
            // outright, with no signals to report.
            if total == 0 {
                return FailureClassification {
                    category: rule.output.category,
                    severity: rule.output.severity,
                    cause: rule.output.cause,
                    confidence: rule.confidence_base,
                    signals: vec![],
                    matched_rule_ids: vec![rule.id.clone()],
                    recommendation: advisory_text(rule.output.cause, rule.output.category),
                    span_id,
                };
            }
            let satisfied: Vec<&Condition> =
                rule.conditions.iter().filter(|condition| evaluate(event, condition)).collect();
            if satisfied.len() != total {
                continue;
            }

            let weight = 1.0 / total as f64;
            let signals = satisfied
                .iter()
                .map(|condition| Signal {
                    signal_type: format!("rule:{}:{}", rule.id, condition.field),
                    signal_value: stringify(extract(event, &condition.field).unwrap_or(&Value::Null)),
                    weight,
                })
                .collect();

            let confidence = rule.confidence_base * (satisfied.len() as f64 / total as f64);
            return FailureClassification {
                category: rule.output.category,
                severity: rule.output.severity,
                cause: rule.output.cause,
                confidence,
                signals,
                matched_rule_ids: vec![rule.id.clone()],
                recommendation: advisory_text(rule.output.cause, rule.output.category),
                span_id,
            };
        }

        FailureClassification {
            category: FailureCategory::Unknown,
            severity: Severity::Informational,
            cause: Cause::Unknown,
            confidence: 0.0,
            signals: vec![Signal { signal_type: "no_match".to_owned(), signal_value: "none".to_owned(), weight: 1.0 }],
            matched_rule_ids: vec![],
            recommendation: advisory_text(Cause::Unknown, FailureCategory::Unknown),
            span_id,
        }
    }
}

/// Extracts a field by dotted path. Any undefined hop yields `None`.
fn extract<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn evaluate(event: &Value, condition: &Condition) -> bool {
    let Some(observed) = extract(event, &condition.field) else {
        return false;
    };
    match condition.operator {
        ConditionOperator::Equals => values_equal(observed, &condition.value),
        ConditionOperator::Contains => {
            stringify(observed).to_lowercase().contains(&stringify(&condition.value).to_lowercase())
        }
        ConditionOperator::Matches => {
            let Some(pattern) = condition.value.as_str() else { return false };
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .is_ok_and(|regex| regex.is_match(&stringify(observed)))
        }
        ConditionOperator::In => {
            condition.value.as_array().is_some_and(|items| items.iter().any(|item| values_equal(observed, item)))
        }
        ConditionOperator::Gt => compare_numeric(observed, &condition.value).is_some_and(|ord| ord.is_gt()),
        ConditionOperator::Lt => compare_numeric(observed, &condition.value).is_some_and(|ord| ord.is_lt()),
        ConditionOperator::Gte => compare_numeric(observed, &condition.value).is_some_and(|ord| ord.is_ge()),
        ConditionOperator::Lte => compare_numeric(observed, &condition.value).is_some_and(|ord| ord.is_le()),
    }
}

fn values_equal(observed: &Value, target: &Value) -> bool {
    if observed == target {
        return true;
    }
    stringify(observed) == stringify(target)
}

/// Compares two JSON values as decimals, parsed from their canonical
/// string forms, so comparisons are exact and not subject to binary
/// floating-point drift across runs.
fn compare_numeric(observed: &Value, target: &Value) -> Option<std::cmp::Ordering> {
    let observed = to_decimal(observed)?;
    let target = to_decimal(target)?;
    Some(observed.cmp(&target))
}

fn to_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(number) => number.to_string().parse().ok(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Fixed advisory-text table keyed by cause then category. Purely
/// documentary: never an actionable signal.
fn advisory_text(cause: Cause, category: FailureCategory) -> String {
    match (cause, category) {
        (Cause::Policy, FailureCategory::ProviderRateLimit) => {
            "Provider-enforced rate limit observed; consider request pacing or quota review.".to_owned()
        }
        (Cause::Policy, FailureCategory::ContentFiltered) => {
            "Content filtering policy triggered; review the prompt or output against provider policy.".to_owned()
        }
        (Cause::Infrastructure, FailureCategory::ProviderServerError) => {
            "Upstream provider reported an internal error; likely transient.".to_owned()
        }
        (Cause::Infrastructure, FailureCategory::Timeout) => {
            "Call exceeded its deadline; check upstream latency trends.".to_owned()
        }
        (Cause::Client, FailureCategory::InvalidRequest) => {
            "Request was rejected as malformed; verify payload shape against provider contract.".to_owned()
        }
        (Cause::Client, FailureCategory::AuthFailure) => {
            "Authentication or authorization failed; verify credentials and scope.".to_owned()
        }
        _ => "No specific guidance available for this failure signature.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ClassificationEngine;
    use super::ClassificationRule;
    use super::Condition;
    use super::ConditionOperator;
    use super::RuleOutput;
    use obscore_core::identity::Cause;
    use obscore_core::identity::FailureCategory;
    use obscore_core::identity::Severity;

    fn rate_limit_rules() -> Vec<ClassificationRule> {
        vec![
            ClassificationRule {
                id: "rate_limit_001".to_owned(),
                priority: 100,
                confidence_base: 0.99,
                conditions: vec![Condition {
                    field: "error.http_status".to_owned(),
                    operator: ConditionOperator::Equals,
                    value: json!(429),
                }],
                output: RuleOutput {
                    category: FailureCategory::ProviderRateLimit,
                    severity: Severity::Medium,
                    cause: Cause::Policy,
                },
            },
            ClassificationRule {
                id: "rate_limit_002".to_owned(),
                priority: 90,
                confidence_base: 0.9,
                conditions: vec![Condition {
                    field: "error.message".to_owned(),
                    operator: ConditionOperator::Contains,
                    value: json!("rate limit"),
                }],
                output: RuleOutput {
                    category: FailureCategory::ProviderRateLimit,
                    severity: Severity::Medium,
                    cause: Cause::Policy,
                },
            },
        ]
    }

    #[test]
    fn higher_priority_rule_wins_the_tiebreak() {
        let engine = ClassificationEngine::new(rate_limit_rules());
        let event = json!({
            "span_id": "span-1",
            "error": { "http_status": 429, "message": "Rate limit exceeded" }
        });
        let result = engine.classify(&event);
        assert_eq!(result.matched_rule_ids, vec!["rate_limit_001"]);
        assert!((result.confidence - 0.99).abs() < f64::EPSILON);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.cause, Cause::Policy);
    }

    #[test]
    fn no_matching_rule_falls_back_to_unknown() {
        let engine = ClassificationEngine::new(rate_limit_rules());
        let event = json!({
            "span_id": "span-2",
            "error": { "message": "Something completely unexpected happened" }
        });
        let result = engine.classify(&event);
        assert_eq!(result.category, FailureCategory::Unknown);
        assert_eq!(result.severity, Severity::Informational);
        assert_eq!(result.cause, Cause::Unknown);
        assert!((result.confidence - 0.0).abs() < f64::EPSILON);
        assert!(result.matched_rule_ids.is_empty());
    }

    #[test]
    fn contains_match_is_case_insensitive() {
        let engine = ClassificationEngine::new(rate_limit_rules());
        let event = json!({
            "span_id": "span-3",
            "error": { "message": "RATE LIMIT EXCEEDED" }
        });
        let result = engine.classify(&event);
        assert_eq!(result.category, FailureCategory::ProviderRateLimit);
    }

    #[test]
    fn zero_condition_rule_matches_vacuously_at_its_priority() {
        let mut rules = rate_limit_rules();
        rules.push(ClassificationRule {
            id: "catch_all_000".to_owned(),
            priority: 95,
            confidence_base: 0.5,
            conditions: vec![],
            output: RuleOutput {
                category: FailureCategory::Unknown,
                severity: Severity::Low,
                cause: Cause::Unknown,
            },
        });
        let engine = ClassificationEngine::new(rules);
        let event = json!({ "span_id": "span-4", "error": { "message": "nothing relevant here" } });
        let result = engine.classify(&event);
        assert_eq!(result.matched_rule_ids, vec!["catch_all_000"]);
        assert!((result.confidence - 0.5).abs() < f64::EPSILON);
        assert!(result.signals.is_empty());
    }
}
