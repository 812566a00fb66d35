// crates/obscore-engines/src/usage/hotspot.rs
// ============================================================================
// Module: Hotspots
// Description: Top-5-per-dimension request concentration, by provider,
//              model, and user.
// Dependencies: obscore-core, serde
// ============================================================================

use std::collections::HashMap;

use obscore_core::telemetry::TelemetryInput;
use serde::Serialize;

/// One dimension value's share of total request volume.
#[derive(Debug, Clone, Serialize)]
pub struct Hotspot {
    pub dimension: String,
    pub value: String,
    pub intensity: f64,
    pub request_count: u64,
    pub percentage_of_total: f64,
}

fn top_five(dimension: &str, counts: HashMap<String, u64>, total: u64) -> Vec<Hotspot> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .take(5)
        .map(|(value, count)| Hotspot {
            dimension: dimension.to_owned(),
            value,
            intensity: if total == 0 { 0.0 } else { count as f64 / total as f64 },
            request_count: count,
            percentage_of_total: if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 },
        })
        .collect()
}

/// Computes top-5 hotspots for provider, model, and user, concatenated and
/// sorted by intensity descending.
#[must_use]
pub fn detect(events: &[&TelemetryInput]) -> Vec<Hotspot> {
    let total = events.len() as u64;

    let mut by_provider: HashMap<String, u64> = HashMap::new();
    let mut by_model: HashMap<String, u64> = HashMap::new();
    let mut by_user: HashMap<String, u64> = HashMap::new();

    for event in events {
        *by_provider.entry(event.provider.as_str().to_owned()).or_insert(0) += 1;
        *by_model.entry(event.model.clone()).or_insert(0) += 1;
        if let Some(user) = &event.metadata.user_id {
            *by_user.entry(user.clone()).or_insert(0) += 1;
        }
    }

    let mut hotspots = Vec::new();
    hotspots.extend(top_five("provider", by_provider, total));
    hotspots.extend(top_five("model", by_model, total));
    hotspots.extend(top_five("user", by_user, total));
    hotspots.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    hotspots
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

    use super::detect;

    fn event(provider: &str) -> TelemetryInput {
        TelemetryInput {
            span_id: SpanId::new("span"),
            trace_id: TraceId::new("trace"),
            parent_span_id: None,
            provider: Provider::new(provider),
            model: "gpt-4o".to_owned(),
            input: CallInput::Text { text: "hi".to_owned() },
            output: None,
            token_usage: None,
            cost: None,
            latency: Latency {
                start_time: Timestamp::parse("2026-07-27T10:00:00Z").expect("valid"),
                end_time: Timestamp::parse("2026-07-27T10:00:00Z").expect("valid"),
                total_ms: 10,
                ttft_ms: None,
            },
            metadata: Metadata::default(),
            status: CallStatus::Ok,
            attributes: Default::default(),
            events: Vec::new(),
        }
    }

    #[test]
    fn dominant_provider_has_highest_intensity() {
        let events = vec![event("openai"), event("openai"), event("openai"), event("anthropic")];
        let refs: Vec<&TelemetryInput> = events.iter().collect();
        let hotspots = detect(&refs);
        let top = hotspots.first().expect("at least one hotspot");
        assert_eq!(top.dimension, "provider");
        assert_eq!(top.value, "openai");
        assert!((top.intensity - 0.75).abs() < 1e-9);
    }
}
