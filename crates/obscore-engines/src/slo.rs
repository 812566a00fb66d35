// crates/obscore-engines/src/slo.rs
// ============================================================================
// Module: SLO Evaluator
// Description: Per-SLO threshold, warning-band, history-aware breach-type,
//              and severity derivation.
// Purpose: Turn a set of SLO definitions and observed metrics into
//          violations and per-SLO statuses.
// Dependencies: obscore-core
// ============================================================================

//! ## Overview
//! One [`SloEvaluator`] evaluates every enabled [`SloDefinition`] against
//! the supplied [`MetricSample`]s. When multiple samples match one SLO, the
//! last matching sample is used — the evaluator never averages or selects
//! by recency beyond input order, matching documented source behavior.
//! History is caller-supplied and never computed across requests.

use obscore_core::decision::SloStatusEntry;
use obscore_core::decision::SloViolation;
use obscore_core::decision::EnforcementResult;
use obscore_core::identity::Severity;
use obscore_core::identity::SloOperator;
use obscore_core::slo::HistoricalContext;
use obscore_core::slo::MetricSample;
use obscore_core::slo::SloDefinition;
use obscore_core::slo::Trend;
use obscore_core::timestamp::Timestamp;

/// Default sample count at which the sample-size confidence factor
/// saturates to `1.0`.
pub const DEFAULT_MIN_SAMPLE_SIZE: u64 = 30;

/// Default age, in milliseconds, past which a metric contributes zero
/// freshness confidence.
pub const DEFAULT_MAX_DATA_AGE_MS: i64 = 3_600_000;

/// Floor applied to evaluator confidence; a violation is never reported
/// with zero confidence.
pub const MIN_CONFIDENCE: f64 = 0.1;

/// Evaluates SLO definitions against metric samples.
pub struct SloEvaluator {
    min_sample_size: u64,
    max_data_age_ms: i64,
}

impl Default for SloEvaluator {
    fn default() -> Self {
        Self { min_sample_size: DEFAULT_MIN_SAMPLE_SIZE, max_data_age_ms: DEFAULT_MAX_DATA_AGE_MS }
    }
}

impl SloEvaluator {
    /// Creates an evaluator with explicit confidence-factor parameters.
    #[must_use]
    pub const fn new(min_sample_size: u64, max_data_age_ms: i64) -> Self {
        Self { min_sample_size, max_data_age_ms }
    }

    /// Evaluates every enabled SLO definition, producing violations and a
    /// status entry per definition (including healthy/unknown ones).
    #[must_use]
    pub fn evaluate(
        &self,
        definitions: &[SloDefinition],
        metrics: &[MetricSample],
        history: Option<&HistoricalContext>,
        now: Timestamp,
    ) -> EnforcementResult {
        let started = std::time::Instant::now();
        let enabled: Vec<&SloDefinition> = definitions.iter().filter(|def| def.enabled).collect();

        let mut violations = Vec::new();
        let mut slo_statuses = Vec::new();
        for definition in &enabled {
            let (status, violation) =
                self.evaluate_one(definition, metrics, history, now);
            slo_statuses.push(status);
            if let Some(violation) = violation {
                violations.push(violation);
            }
        }

        EnforcementResult {
            violations,
            slo_statuses,
            metrics_evaluated: metrics.len() as u64,
            slos_evaluated: enabled.len() as u64,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn evaluate_one(
        &self,
        definition: &SloDefinition,
        metrics: &[MetricSample],
        history: Option<&HistoricalContext>,
        now: Timestamp,
    ) -> (SloStatusEntry, Option<SloViolation>) {
        let previous_breaches = history.map_or(0, |hist| hist.previous_breaches);

        let Some(metric) = metrics
            .iter()
            .filter(|sample| sample.matches(definition.indicator, &definition.window, &definition.scope))
            .next_back()
        else {
            let status = SloStatusEntry {
                slo_id: definition.slo_id.clone(),
                status: "unknown".to_owned(),
                consecutive_breach_count: previous_breaches,
                compliance_percentage: None,
            };
            return (status, None);
        };

        let is_breach = breach_against(definition.operator, metric.value, definition.threshold);
        let warning_threshold =
            warning_threshold(definition.operator, definition.threshold, definition.warning_threshold_percentage);
        let is_near_breach = !is_breach && breach_against(definition.operator, metric.value, warning_threshold);
        let deviation = deviation_percentage(definition.operator, metric.value, definition.threshold);

        let breach_type: &str = if is_breach {
            if definition.is_sla {
                "sla_breach"
            } else if previous_breaches > 0 {
                "consecutive_breach"
            } else {
                "slo_breach"
            }
        } else if is_near_breach {
            "near_breach"
        } else {
            ""
        };

        let status_label = if is_breach { "breached" } else if is_near_breach { "warning" } else { "healthy" };
        let consecutive_breach_count = if is_breach { previous_breaches + 1 } else { 0 };
        let compliance_percentage = history.map(|hist| compliance_percentage(hist, is_breach));

        let status = SloStatusEntry {
            slo_id: definition.slo_id.clone(),
            status: status_label.to_owned(),
            consecutive_breach_count,
            compliance_percentage,
        };

        if breach_type.is_empty() {
            return (status, None);
        }

        let severity = severity_for(breach_type, previous_breaches, deviation);
        let confidence = self.confidence_for(metric, now, history);

        let violation = SloViolation {
            slo_id: definition.slo_id.clone(),
            breach_type: breach_type.to_owned(),
            severity,
            deviation_percentage: deviation,
            is_sla: definition.is_sla,
            sla_penalty_tier: definition.sla_penalty_tier,
            confidence,
        };

        (status, Some(violation))
    }

    fn confidence_for(&self, metric: &MetricSample, now: Timestamp, history: Option<&HistoricalContext>) -> f64 {
        let sample_count = metric.sample_count.unwrap_or(0);
        let sample_size_factor = (sample_count as f64 / self.min_sample_size.max(1) as f64).min(1.0);

        let age_ms = now.millis_since(metric.timestamp);
        let freshness_factor = (1.0 - age_ms as f64 / self.max_data_age_ms.max(1) as f64).max(0.0);

        let consistency_factor = match history.and_then(|hist| hist.trend) {
            Some(Trend::Stable) => 1.0,
            Some(Trend::Improving | Trend::Degrading) => 0.8,
            Some(Trend::Volatile) => 0.5,
            None => 0.8,
        };

        let coverage_factor = if sample_count > 0 { 1.0 } else { 0.5 };

        let weighted =
            0.30 * sample_size_factor + 0.30 * freshness_factor + 0.25 * consistency_factor + 0.15 * coverage_factor;
        weighted.clamp(MIN_CONFIDENCE, 1.0)
    }
}

fn breach_against(operator: SloOperator, value: f64, threshold: f64) -> bool {
    match operator {
        SloOperator::Lt => value >= threshold,
        SloOperator::Lte => value > threshold,
        SloOperator::Gt => value <= threshold,
        SloOperator::Gte => value < threshold,
        SloOperator::Eq => (value - threshold).abs() > f64::EPSILON,
        SloOperator::Neq => (value - threshold).abs() <= f64::EPSILON,
    }
}

fn warning_threshold(operator: SloOperator, threshold: f64, warning_pct: f64) -> f64 {
    let ratio = warning_pct / 100.0;
    if operator.is_upper_bound() {
        threshold * ratio
    } else if ratio <= 0.0 {
        f64::INFINITY
    } else {
        threshold / ratio
    }
}

fn deviation_percentage(operator: SloOperator, value: f64, threshold: f64) -> f64 {
    if threshold == 0.0 {
        return if value > 0.0 { 100.0 } else { 0.0 };
    }
    if operator.is_upper_bound() {
        (value - threshold) / threshold * 100.0
    } else {
        (threshold - value) / threshold * 100.0
    }
}

fn severity_for(breach_type: &str, previous_breaches: u32, deviation_percentage: f64) -> Severity {
    match breach_type {
        "sla_breach" => Severity::Critical,
        "near_breach" => Severity::Low,
        "consecutive_breach" => {
            if previous_breaches >= 3 {
                Severity::Critical
            } else {
                Severity::High
            }
        }
        _ => severity_by_deviation(deviation_percentage),
    }
}

fn severity_by_deviation(deviation_percentage: f64) -> Severity {
    let magnitude = deviation_percentage.abs();
    if magnitude > 50.0 {
        Severity::Critical
    } else if magnitude > 25.0 {
        Severity::High
    } else if magnitude > 10.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn compliance_percentage(history: &HistoricalContext, is_breach: bool) -> f64 {
    let total = history.previous_values.len() as f64 + 1.0;
    let breaches = f64::from(history.previous_breaches) + f64::from(u8::from(is_breach));
    (100.0 * (1.0 - breaches / total)).clamp(0.0, 100.0)
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

    use obscore_core::identity::MetricId;
    use obscore_core::identity::SloId;
    use obscore_core::identity::SloIndicator;
    use obscore_core::identity::SloOperator;
    use obscore_core::slo::HistoricalContext;
    use obscore_core::slo::MetricSample;
    use obscore_core::slo::ScopeFilter;
    use obscore_core::slo::SloDefinition;
    use obscore_core::slo::Window;
    use obscore_core::timestamp::Timestamp;
    use uuid::Uuid;

    use super::SloEvaluator;

    fn metric(indicator: SloIndicator, window: &str, value: f64, sample_count: Option<u64>) -> MetricSample {
        MetricSample {
            metric_id: MetricId::from_uuid(Uuid::new_v4()),
            indicator,
            value,
            window: Window::new(window),
            timestamp: Timestamp::parse("2026-07-27T10:00:00Z").expect("valid"),
            sample_count,
            scope: ScopeFilter::default(),
        }
    }

    fn definition(
        indicator: SloIndicator,
        operator: SloOperator,
        threshold: f64,
        window: &str,
        is_sla: bool,
        sla_penalty_tier: Option<u8>,
    ) -> SloDefinition {
        SloDefinition {
            slo_id: SloId::new("slo-1"),
            name: "test".to_owned(),
            indicator,
            operator,
            threshold,
            window: Window::new(window),
            scope: ScopeFilter::default(),
            is_sla,
            sla_penalty_tier,
            warning_threshold_percentage: 80.0,
            enabled: true,
        }
    }

    #[test]
    fn sla_breach_is_critical_with_expected_deviation() {
        let definitions = vec![definition(SloIndicator::Availability, SloOperator::Gte, 99.9, "24h", true, Some(2))];
        let metrics = vec![metric(SloIndicator::Availability, "24h", 98.5, Some(86_400))];
        let now = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid");
        let result = SloEvaluator::default().evaluate(&definitions, &metrics, None, now);

        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.breach_type, "sla_breach");
        assert_eq!(violation.severity, obscore_core::identity::Severity::Critical);
        assert!(violation.is_sla);
        assert_eq!(violation.sla_penalty_tier, Some(2));
        assert!((violation.deviation_percentage - 1.401_401_401_401_401_4).abs() < 1e-9);
    }

    #[test]
    fn near_breach_is_reported_as_low_warning() {
        let definitions = vec![definition(SloIndicator::ErrorRate, SloOperator::Lt, 5.0, "5m", false, None)];
        let metrics = vec![metric(SloIndicator::ErrorRate, "5m", 4.2, None)];
        let now = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid");
        let result = SloEvaluator::default().evaluate(&definitions, &metrics, None, now);

        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.breach_type, "near_breach");
        assert_eq!(violation.severity, obscore_core::identity::Severity::Low);
        assert_eq!(result.slo_statuses[0].status, "warning");
    }

    #[test]
    fn healthy_metric_produces_no_violation() {
        let definitions = vec![definition(SloIndicator::Throughput, SloOperator::Gte, 100.0, "1m", false, None)];
        let metrics = vec![metric(SloIndicator::Throughput, "1m", 150.0, None)];
        let now = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid");
        let result = SloEvaluator::default().evaluate(&definitions, &metrics, None, now);

        assert!(result.violations.is_empty());
        assert_eq!(result.slo_statuses.len(), 1);
        assert_eq!(result.slo_statuses[0].status, "healthy");
    }

    #[test]
    fn consecutive_breach_escalates_with_history() {
        let definitions = vec![definition(SloIndicator::Latency, SloOperator::Lt, 200.0, "1m", false, None)];
        let metrics = vec![metric(SloIndicator::Latency, "1m", 250.0, Some(10))];
        let history = HistoricalContext { previous_breaches: 4, ..Default::default() };
        let now = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid");
        let result = SloEvaluator::default().evaluate(&definitions, &metrics, Some(&history), now);

        let violation = &result.violations[0];
        assert_eq!(violation.breach_type, "consecutive_breach");
        assert_eq!(violation.severity, obscore_core::identity::Severity::Critical);
        assert_eq!(result.slo_statuses[0].consecutive_breach_count, 5);
    }

    #[test]
    fn no_matching_metric_is_unknown_status() {
        let definitions = vec![definition(SloIndicator::Cost, SloOperator::Lt, 10.0, "1h", false, None)];
        let now = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid");
        let result = SloEvaluator::default().evaluate(&definitions, &[], None, now);

        assert!(result.violations.is_empty());
        assert_eq!(result.slo_statuses[0].status, "unknown");
    }
}
