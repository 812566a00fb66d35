// crates/obscore-core/src/slo.rs
// ============================================================================
// Module: SLO Data Model
// Description: SLO definitions, metric samples, and caller-supplied history.
// Purpose: The shape the SLO evaluator consumes as input.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `SloDefinition` is configuration: it names a threshold and the dimension
//! it applies to. `MetricSample` is an observation: one measured value for
//! one indicator in one window. `HistoricalContext` is optional caller
//! context — the evaluator never computes history itself, it only consumes
//! what is supplied.

use serde::Deserialize;
use serde::Serialize;

use crate::identity::MetricId;
use crate::identity::Provider;
use crate::identity::SloId;
use crate::identity::SloIndicator;
use crate::identity::SloOperator;
use crate::timestamp::Timestamp;

/// The averaging/observation window an SLO or metric sample applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Window(String);

impl Window {
    /// Creates a new window, e.g. `"5m"`, `"24h"`, `"30d"`.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the window as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A directional historical trend, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Metric is moving toward healthier values.
    Improving,
    /// Metric is not materially changing.
    Stable,
    /// Metric is moving toward unhealthier values.
    Degrading,
    /// Metric has no discernible trend.
    Volatile,
}

/// Optional scope filters narrowing which samples an SLO applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    /// Restrict to a single provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Restrict to a single model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Restrict to a single deployment environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// A service-level objective definition.
///
/// # Invariants
/// - `warning_threshold_percentage` is in `[0, 100]`.
/// - `sla_penalty_tier`, when present, is in `[1, 5]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SloDefinition {
    /// SLO identifier.
    pub slo_id: SloId,
    /// Human-readable name.
    pub name: String,
    /// The metric dimension this SLO constrains.
    pub indicator: SloIndicator,
    /// Comparison operator vs. `threshold`.
    pub operator: SloOperator,
    /// Threshold value, in the indicator's native unit.
    pub threshold: f64,
    /// Observation window, e.g. `"5m"`.
    pub window: Window,
    /// Scope filters narrowing which samples apply.
    #[serde(default, flatten)]
    pub scope: ScopeFilter,
    /// Whether this SLO is a contractual SLA.
    pub is_sla: bool,
    /// SLA penalty tier, `[1, 5]`, present only when `is_sla`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_penalty_tier: Option<u8>,
    /// Percentage of threshold at which a near-breach warning fires.
    #[serde(default = "default_warning_threshold_percentage")]
    pub warning_threshold_percentage: f64,
    /// Whether this SLO is actively evaluated.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_warning_threshold_percentage() -> f64 {
    80.0
}

const fn default_enabled() -> bool {
    true
}

impl SloDefinition {
    /// Validates `warning_threshold_percentage` and `sla_penalty_tier` range
    /// invariants.
    ///
    /// # Errors
    /// Returns a message naming the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.warning_threshold_percentage) {
            return Err(format!(
                "warning_threshold_percentage {} out of range [0, 100]",
                self.warning_threshold_percentage
            ));
        }
        if let Some(tier) = self.sla_penalty_tier {
            if !(1..=5).contains(&tier) {
                return Err(format!("sla_penalty_tier {tier} out of range [1, 5]"));
            }
        }
        Ok(())
    }
}

/// A single observed metric value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Unique identifier for this sample.
    pub metric_id: MetricId,
    /// The metric dimension this sample measures.
    pub indicator: SloIndicator,
    /// Observed value.
    pub value: f64,
    /// Observation window this sample covers.
    pub window: Window,
    /// When this sample was recorded.
    pub timestamp: Timestamp,
    /// Number of underlying observations this sample summarizes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u64>,
    /// Scope this sample was recorded under.
    #[serde(default, flatten)]
    pub scope: ScopeFilter,
}

impl MetricSample {
    /// Returns `true` if `sla_penalty_tier`/`sample_count` obey their range
    /// invariants (`sample_count >= 1` when present).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.sample_count.is_none_or(|count| count >= 1)
    }

    /// Returns `true` if this sample matches the given indicator, window,
    /// and scope filters (missing filters match anything).
    #[must_use]
    pub fn matches(&self, indicator: SloIndicator, window: &Window, scope: &ScopeFilter) -> bool {
        if self.indicator != indicator {
            return false;
        }
        if self.window != *window {
            return false;
        }
        if let Some(provider) = &scope.provider {
            if self.scope.provider.as_ref() != Some(provider) {
                return false;
            }
        }
        if let Some(model) = &scope.model {
            if self.scope.model.as_deref() != Some(model.as_str()) {
                return false;
            }
        }
        if let Some(environment) = &scope.environment {
            if self.scope.environment.as_deref() != Some(environment.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Caller-supplied prior state for an SLO, never computed by the evaluator
/// across requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalContext {
    /// Prior observed values, oldest first.
    #[serde(default)]
    pub previous_values: Vec<f64>,
    /// Count of prior breaches.
    #[serde(default)]
    pub previous_breaches: u32,
    /// When the most recent prior breach occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_breach_at: Option<Timestamp>,
    /// Mean of `previous_values`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    /// 95th percentile of `previous_values`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    /// Caller-classified trend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
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

    use super::MetricSample;
    use super::ScopeFilter;
    use super::Window;
    use crate::identity::MetricId;
    use crate::identity::Provider;
    use crate::identity::SloIndicator;
    use crate::timestamp::Timestamp;
    use uuid::Uuid;

    fn sample(provider: Option<&str>) -> MetricSample {
        MetricSample {
            metric_id: MetricId::from_uuid(Uuid::new_v4()),
            indicator: SloIndicator::Availability,
            value: 99.9,
            window: Window::new("24h"),
            timestamp: Timestamp::parse("2026-07-27T10:00:00Z").expect("valid"),
            sample_count: Some(86_400),
            scope: ScopeFilter {
                provider: provider.map(Provider::new),
                model: None,
                environment: None,
            },
        }
    }

    #[test]
    fn matches_requires_equal_provider_when_filter_present() {
        let sample = sample(Some("openai"));
        let filter = ScopeFilter { provider: Some(Provider::new("anthropic")), model: None, environment: None };
        assert!(!sample.matches(SloIndicator::Availability, &Window::new("24h"), &filter));
    }

    #[test]
    fn matches_ignores_unset_filters() {
        let sample = sample(Some("openai"));
        let filter = ScopeFilter::default();
        assert!(sample.matches(SloIndicator::Availability, &Window::new("24h"), &filter));
    }

    #[test]
    fn sample_count_zero_is_invalid() {
        let mut sample = sample(None);
        sample.sample_count = Some(0);
        assert!(!sample.is_valid());
    }
}
