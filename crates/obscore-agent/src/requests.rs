// crates/obscore-agent/src/requests.rs
// ============================================================================
// Module: Route Request Shapes
// Description: Typed request bodies for the analytical routes, convertible
//              from the JSON value every route validates first.
// Purpose: Give each route a typed body to hand its engine, without
//          duplicating the schema's own field constraints in Rust types.
// Dependencies: obscore-core, obscore-engines, serde, serde_json
// ============================================================================

//! ## Overview
//! Every route validates the raw JSON body against its compiled schema
//! first ([`crate::error::PipelineError::Validation`] on failure), then
//! deserializes the same value into one of these typed shapes. A body that
//! passes schema validation always deserializes cleanly — the schema is the
//! stricter check, keyed on the same required/allowed fields.

use obscore_core::slo::HistoricalContext;
use obscore_core::slo::MetricSample;
use obscore_core::slo::SloDefinition;
use obscore_core::telemetry::TelemetryInput;
use obscore_core::timestamp::Timestamp;
use obscore_engines::usage::bucket::Granularity;
use obscore_engines::usage::bucket::TimeWindow as EngineTimeWindow;
use obscore_engines::UsageFilters;
use obscore_engines::UsageOptions;
use serde::Deserialize;
use serde_json::Value;

/// A batch envelope, generic over the per-item shape. Order is preserved:
/// `items[i]` in the request always corresponds to `items[i]` in the
/// response.
#[derive(Debug, Deserialize)]
pub struct BatchRequest<T> {
    /// The items to process, in order.
    pub items: Vec<T>,
    /// Caller-supplied correlation id, carried through unchanged if
    /// present.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// When `true`, processing stops at the first item that fails; when
    /// `false` or absent, every item is attempted and failures are reported
    /// per item.
    #[serde(default)]
    pub fail_fast: bool,
}

/// Body of a `POST /enforce` request.
#[derive(Debug, Deserialize)]
pub struct SloEnforcementRequest {
    /// SLO definitions to evaluate.
    pub slo_definitions: Vec<SloDefinition>,
    /// Observed metric samples.
    pub metrics: Vec<MetricSample>,
    /// Caller-supplied prior state, if any.
    #[serde(default)]
    pub historical_context: Option<HistoricalContext>,
}

/// Wire shape of a time window before it is resolved into an engine
/// [`EngineTimeWindow`].
#[derive(Debug, Deserialize)]
pub struct TimeWindowRequest {
    /// Window start, inclusive.
    pub start: Timestamp,
    /// Window end, exclusive.
    pub end: Timestamp,
    /// Bucket granularity name: `minute | hour | day | week | month`.
    pub granularity: String,
}

/// Raised when a time window names an unrecognized granularity. Unreachable
/// once the request has passed schema validation, since the schema pins the
/// same closed enum.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unrecognized granularity '{0}'")]
pub struct InvalidGranularity(pub String);

impl TimeWindowRequest {
    /// Resolves this wire-shape window into the engine's time window,
    /// naming the granularity if unrecognized.
    ///
    /// # Errors
    /// Returns [`InvalidGranularity`] if `granularity` is not one of the
    /// closed set.
    pub fn into_engine_window(self) -> Result<EngineTimeWindow, InvalidGranularity> {
        let granularity = match self.granularity.as_str() {
            "minute" => Granularity::Minute,
            "hour" => Granularity::Hour,
            "day" => Granularity::Day,
            "week" => Granularity::Week,
            "month" => Granularity::Month,
            other => return Err(InvalidGranularity(other.to_owned())),
        };
        Ok(EngineTimeWindow { start: self.start, end: self.end, granularity })
    }
}

/// Dimension filters as they arrive on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct UsageFiltersRequest {
    /// Restrict to a single provider.
    #[serde(default)]
    pub provider: Option<String>,
    /// Restrict to a single model.
    #[serde(default)]
    pub model: Option<String>,
    /// Restrict to a single deployment environment.
    #[serde(default)]
    pub environment: Option<String>,
}

impl UsageFiltersRequest {
    /// Converts into the engine's filter type.
    #[must_use]
    pub fn into_engine_filters(self) -> UsageFilters {
        UsageFilters {
            provider: self.provider.map(obscore_core::identity::Provider::new),
            model: self.model,
            environment: self.environment,
        }
    }
}

/// Analysis options as they arrive on the wire.
#[derive(Debug, Deserialize)]
pub struct UsageOptionsRequest {
    /// Percentile ranks to report, defaulting to `[50, 90, 95, 99]`.
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    /// Whether to compute regression-based trends.
    #[serde(default)]
    pub include_trends: bool,
    /// Whether to compute hour/day/week seasonality.
    #[serde(default)]
    pub include_seasonality: bool,
}

impl Default for UsageOptionsRequest {
    fn default() -> Self {
        Self { percentiles: default_percentiles(), include_trends: false, include_seasonality: false }
    }
}

fn default_percentiles() -> Vec<f64> {
    vec![50.0, 90.0, 95.0, 99.0]
}

impl UsageOptionsRequest {
    /// Converts into the engine's options type.
    #[must_use]
    pub fn into_engine_options(self) -> UsageOptions {
        UsageOptions {
            percentiles: self.percentiles,
            include_trends: self.include_trends,
            include_seasonality: self.include_seasonality,
        }
    }
}

/// Body of a `POST /analyze` request.
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    /// The telemetry events to aggregate.
    pub events: Vec<TelemetryInput>,
    /// The time window to aggregate over.
    pub time_window: TimeWindowRequest,
    /// Dimension filters.
    #[serde(default)]
    pub filters: UsageFiltersRequest,
    /// Opt-in analysis sections.
    #[serde(default)]
    pub options: UsageOptionsRequest,
}

/// Body of a `POST /generate` request when this process runs
/// `AgentKind::Visualization`.
#[derive(Debug, Deserialize)]
pub struct VisualizationRequest {
    /// Chart kind, e.g. `"time_series"`, `"histogram"`.
    pub chart_type: String,
    /// Opaque reference to the data the chart renders.
    pub data_ref: String,
    /// Caller-supplied rendering options, carried through opaquely.
    #[serde(default)]
    pub options: Option<Value>,
}

/// Body of a `POST /generate` request when this process runs
/// `AgentKind::PostMortem`.
#[derive(Debug, Deserialize)]
pub struct PostMortemRequest {
    /// The telemetry events contributing to this incident.
    pub events: Vec<TelemetryInput>,
    /// Prior SLO violations contributing to this incident, by `slo_id`.
    #[serde(default)]
    pub slo_violation_ids: Vec<String>,
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

    use super::TimeWindowRequest;

    #[test]
    fn recognized_granularity_resolves() {
        let window = TimeWindowRequest {
            start: obscore_core::timestamp::Timestamp::parse("2026-07-27T00:00:00Z").expect("valid"),
            end: obscore_core::timestamp::Timestamp::parse("2026-07-27T01:00:00Z").expect("valid"),
            granularity: "hour".to_owned(),
        };
        window.into_engine_window().expect("hour is recognized");
    }

    #[test]
    fn unrecognized_granularity_is_rejected() {
        let window = TimeWindowRequest {
            start: obscore_core::timestamp::Timestamp::parse("2026-07-27T00:00:00Z").expect("valid"),
            end: obscore_core::timestamp::Timestamp::parse("2026-07-27T01:00:00Z").expect("valid"),
            granularity: "fortnight".to_owned(),
        };
        assert!(window.into_engine_window().is_err());
    }
}
