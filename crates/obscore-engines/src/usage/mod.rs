// crates/obscore-engines/src/usage/mod.rs
// ============================================================================
// Module: Usage Aggregator
// Description: Statistical aggregator over a slice of telemetry: time
//              bucketing, distributions, provider/model breakdown,
//              regression trends, seasonality, hotspots, and growth
//              classification.
// Purpose: The analytical component of the usage-pattern-analysis agent.
// Dependencies: obscore-core, serde_json, time
// ============================================================================

//! ## Overview
//! [`UsageAggregator::aggregate`] is the single entry point: it filters the
//! input slice by [`UsageFilters`], then derives every section of
//! [`obscore_core::decision::UsagePatternAnalysis`] from that one filtered
//! set, so every section agrees on which events were in scope.

pub mod bucket;
pub mod distribution;
pub mod growth;
pub mod hotspot;
pub mod seasonality;
pub mod trend;

use std::collections::BTreeMap;

use obscore_core::decision::UsagePatternAnalysis;
use obscore_core::identity::Provider;
use obscore_core::telemetry::CallStatus;
use obscore_core::telemetry::TelemetryInput;
use serde::Serialize;
use serde_json::Value;

use self::bucket::BucketStats;
use self::bucket::TimeWindow;
use self::distribution::Distribution;
use self::trend::MIN_SAMPLE_SIZE_FOR_TRENDS;

/// Dimension filters narrowing which events are in scope.
#[derive(Debug, Clone, Default)]
pub struct UsageFilters {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub environment: Option<String>,
}

impl UsageFilters {
    fn matches(&self, event: &TelemetryInput) -> bool {
        if let Some(provider) = &self.provider {
            if event.provider != *provider {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if &event.model != model {
                return false;
            }
        }
        if let Some(environment) = &self.environment {
            if event.metadata.environment.as_deref() != Some(environment.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Opt-in analysis sections and percentile selection.
#[derive(Debug, Clone)]
pub struct UsageOptions {
    /// Percentile ranks reported in each distribution, e.g. `[50, 90, 95,
    /// 99]`. Limited to 100 entries by the caller's validation layer.
    pub percentiles: Vec<f64>,
    pub include_trends: bool,
    pub include_seasonality: bool,
}

impl Default for UsageOptions {
    fn default() -> Self {
        Self { percentiles: vec![50.0, 90.0, 95.0, 99.0], include_trends: false, include_seasonality: false }
    }
}

/// One aggregation request.
#[derive(Debug, Clone)]
pub struct UsageRequest {
    pub window: TimeWindow,
    pub filters: UsageFilters,
    pub options: UsageOptions,
}

#[derive(Debug, Serialize)]
struct Summary {
    unique_users: u64,
    unique_sessions: u64,
    unique_providers: u64,
    unique_models: u64,
    total_requests: u64,
    total_tokens: u64,
    total_cost_usd: f64,
    total_errors: u64,
    error_rate: f64,
    avg_requests_per_user: f64,
}

#[derive(Debug, Serialize)]
struct ModelUsage {
    model: String,
    request_count: u64,
    percentage_of_total: f64,
}

#[derive(Debug, Serialize)]
struct ProviderUsage {
    provider: String,
    request_count: u64,
    percentage_of_total: f64,
    models: Vec<ModelUsage>,
}

/// Stateless driver over [`UsageRequest`]s; holds no per-call state.
#[derive(Debug, Default)]
pub struct UsageAggregator;

impl UsageAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs every aggregation section over `events`, scoped by
    /// `request.filters` and `request.window`.
    #[must_use]
    pub fn aggregate(&self, events: &[TelemetryInput], request: &UsageRequest) -> UsagePatternAnalysis {
        let filtered: Vec<&TelemetryInput> = events
            .iter()
            .filter(|event| request.filters.matches(event) && within_window(event, &request.window))
            .collect();

        let buckets = bucket::bucket_events(&filtered, &request.window);
        let summary = summarize(&filtered);
        let distributions = distributions(&filtered, &request.options.percentiles);
        let provider_usage = provider_usage(&filtered);

        let series = metric_series(&buckets);
        let trends = if request.options.include_trends && buckets.len() >= MIN_SAMPLE_SIZE_FOR_TRENDS {
            Some(
                series
                    .iter()
                    .map(|(name, values)| trend::trend(name, values))
                    .collect::<Vec<_>>(),
            )
        } else {
            None
        };

        let seasonality = if request.options.include_seasonality {
            let patterns = seasonality::detect(&filtered);
            if patterns.is_empty() { None } else { Some(patterns) }
        } else {
            None
        };

        let hotspots = hotspot::detect(&filtered);
        let growth_patterns: Vec<_> = series
            .iter()
            .filter_map(|(name, values)| growth::growth_pattern(name, values))
            .collect();

        let sample_size = filtered.len() as u64;
        let overall_confidence = 1.0 - (-0.001 * sample_size as f64).exp();

        UsagePatternAnalysis {
            summary: to_value(&summary),
            time_series: to_value(&buckets),
            distributions: to_value(&distributions),
            provider_usage: to_value(&provider_usage),
            trends: trends.map(|value| to_value(&value)),
            seasonality: seasonality.map(|value| to_value(&value)),
            hotspots: to_value(&hotspots),
            growth_patterns: to_value(&growth_patterns),
            overall_confidence,
            sample_size,
        }
    }
}

fn within_window(event: &TelemetryInput, window: &TimeWindow) -> bool {
    event.latency.start_time >= window.start && event.latency.start_time < window.end
}

fn summarize(events: &[&TelemetryInput]) -> Summary {
    let mut users = std::collections::BTreeSet::new();
    let mut sessions = std::collections::BTreeSet::new();
    let mut providers = std::collections::BTreeSet::new();
    let mut models = std::collections::BTreeSet::new();
    let mut total_tokens = 0_u64;
    let mut total_cost_usd = 0.0_f64;
    let mut total_errors = 0_u64;

    for event in events {
        if let Some(user) = &event.metadata.user_id {
            users.insert(user.clone());
        }
        if let Some(session) = &event.metadata.session_id {
            sessions.insert(session.clone());
        }
        providers.insert(event.provider.as_str().to_owned());
        models.insert(event.model.clone());
        if let Some(usage) = event.token_usage {
            total_tokens += usage.total;
        }
        if let Some(cost) = event.cost {
            total_cost_usd += cost.amount_usd;
        }
        if matches!(event.status, CallStatus::Error) {
            total_errors += 1;
        }
    }

    let total_requests = events.len() as u64;
    Summary {
        unique_users: users.len() as u64,
        unique_sessions: sessions.len() as u64,
        unique_providers: providers.len() as u64,
        unique_models: models.len() as u64,
        total_requests,
        total_tokens,
        total_cost_usd,
        total_errors,
        error_rate: if total_requests == 0 { 0.0 } else { total_errors as f64 / total_requests as f64 },
        avg_requests_per_user: if users.is_empty() { 0.0 } else { total_requests as f64 / users.len() as f64 },
    }
}

struct Distributions {
    latency_ms: Option<Distribution>,
    tokens: Option<Distribution>,
    cost_usd: Option<Distribution>,
}

impl Serialize for Distributions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        if let Some(value) = &self.latency_ms {
            map.serialize_entry("latency_ms", value)?;
        }
        if let Some(value) = &self.tokens {
            map.serialize_entry("tokens", value)?;
        }
        if let Some(value) = &self.cost_usd {
            map.serialize_entry("cost_usd", value)?;
        }
        map.end()
    }
}

fn distributions(events: &[&TelemetryInput], percentile_ranks: &[f64]) -> Distributions {
    let latency: Vec<f64> = events.iter().map(|event| event.latency.total_ms as f64).collect();
    let tokens: Vec<f64> =
        events.iter().filter_map(|event| event.token_usage.map(|usage| usage.total as f64)).collect();
    let cost: Vec<f64> = events.iter().filter_map(|event| event.cost.map(|cost| cost.amount_usd)).collect();

    Distributions {
        latency_ms: distribution::distribution(&latency, percentile_ranks),
        tokens: distribution::distribution(&tokens, percentile_ranks),
        cost_usd: distribution::distribution(&cost, percentile_ranks),
    }
}

fn provider_usage(events: &[&TelemetryInput]) -> Vec<ProviderUsage> {
    let total = events.len() as u64;
    let mut by_provider: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for event in events {
        let models = by_provider.entry(event.provider.as_str().to_owned()).or_default();
        *models.entry(event.model.clone()).or_insert(0) += 1;
    }

    let mut providers: Vec<ProviderUsage> = by_provider
        .into_iter()
        .map(|(provider, models)| {
            let provider_count: u64 = models.values().sum();
            let mut models: Vec<ModelUsage> = models
                .into_iter()
                .map(|(model, count)| ModelUsage {
                    model,
                    request_count: count,
                    percentage_of_total: percentage(count, total),
                })
                .collect();
            models.sort_by(|a, b| b.request_count.cmp(&a.request_count).then_with(|| a.model.cmp(&b.model)));
            ProviderUsage {
                provider,
                request_count: provider_count,
                percentage_of_total: percentage(provider_count, total),
                models,
            }
        })
        .collect();

    providers.sort_by(|a, b| b.request_count.cmp(&a.request_count).then_with(|| a.provider.cmp(&b.provider)));
    providers
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 }
}

fn metric_series(buckets: &[BucketStats]) -> [(&'static str, Vec<f64>); 5] {
    [
        ("request_count", buckets.iter().map(|bucket| bucket.request_count as f64).collect()),
        ("total_tokens", buckets.iter().map(|bucket| bucket.total_tokens as f64).collect()),
        ("total_cost_usd", buckets.iter().map(|bucket| bucket.total_cost_usd).collect()),
        ("avg_latency_ms", buckets.iter().map(|bucket| bucket.avg_latency_ms).collect()),
        ("error_count", buckets.iter().map(|bucket| bucket.error_count as f64).collect()),
    ]
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
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

    use obscore_core::identity::Provider;
    use obscore_core::identity::SpanId;
    use obscore_core::identity::TraceId;
    use obscore_core::telemetry::CallInput;
    use obscore_core::telemetry::CallStatus;
    use obscore_core::telemetry::Latency;
    use obscore_core::telemetry::Metadata;
    use obscore_core::telemetry::TelemetryInput;
    use obscore_core::timestamp::Timestamp;

    use super::bucket::Granularity;
    use super::bucket::TimeWindow;
    use super::UsageAggregator;
    use super::UsageFilters;
    use super::UsageOptions;
    use super::UsageRequest;

    fn event(hour: u8) -> TelemetryInput {
        TelemetryInput {
            span_id: SpanId::new("span"),
            trace_id: TraceId::new("trace"),
            parent_span_id: None,
            provider: Provider::new("openai"),
            model: "gpt-4o".to_owned(),
            input: CallInput::Text { text: "hi".to_owned() },
            output: None,
            token_usage: None,
            cost: None,
            latency: Latency {
                start_time: Timestamp::parse(&format!("2026-07-27T{hour:02}:00:00Z")).expect("valid"),
                end_time: Timestamp::parse(&format!("2026-07-27T{hour:02}:00:01Z")).expect("valid"),
                total_ms: 100,
                ttft_ms: None,
            },
            metadata: Metadata::default(),
            status: CallStatus::Ok,
            attributes: Default::default(),
            events: Vec::new(),
        }
    }

    #[test]
    fn aggregate_reports_sample_size_and_confidence() {
        let events = vec![event(1), event(2), event(3)];
        let request = UsageRequest {
            window: TimeWindow {
                start: Timestamp::parse("2026-07-27T00:00:00Z").expect("valid"),
                end: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
                granularity: Granularity::Hour,
            },
            filters: UsageFilters::default(),
            options: UsageOptions::default(),
        };
        let analysis = UsageAggregator::new().aggregate(&events, &request);
        assert_eq!(analysis.sample_size, 3);
        assert!(analysis.overall_confidence > 0.0 && analysis.overall_confidence < 1.0);
        assert!(analysis.trends.is_none());
    }

    #[test]
    fn empty_bucket_still_appears_in_time_series() {
        let events = vec![event(1)];
        let request = UsageRequest {
            window: TimeWindow {
                start: Timestamp::parse("2026-07-27T00:00:00Z").expect("valid"),
                end: Timestamp::parse("2026-07-27T03:00:00Z").expect("valid"),
                granularity: Granularity::Hour,
            },
            filters: UsageFilters::default(),
            options: UsageOptions::default(),
        };
        let analysis = UsageAggregator::new().aggregate(&events, &request);
        let buckets = analysis.time_series.as_array().expect("array of buckets");
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[1]["request_count"].as_u64(), Some(0));
    }
}
