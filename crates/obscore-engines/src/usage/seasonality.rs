// crates/obscore-engines/src/usage/seasonality.rs
// ============================================================================
// Module: Seasonality
// Description: Detects hour-of-day, day-of-week, and ISO-week-of-year
//              variation in request volume via coefficient of variation.
// Dependencies: obscore-core, serde, time
// ============================================================================

use std::collections::BTreeMap;

use obscore_core::telemetry::TelemetryInput;
use serde::Serialize;

use super::distribution::coefficient_of_variation;

/// One seasonality pattern's detection result.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalityPattern {
    pub pattern_type: String,
    pub detected: bool,
    pub strength: f64,
    pub peak_periods: Vec<String>,
    pub trough_periods: Vec<String>,
    pub confidence: f64,
}

struct Thresholds {
    pattern_type: &'static str,
    cv_threshold: f64,
    epsilon: f64,
    min_groups: usize,
    strength_k: f64,
    total_groups: usize,
}

const HOURLY: Thresholds = Thresholds {
    pattern_type: "hour_of_day",
    cv_threshold: 0.2,
    epsilon: 0.2,
    min_groups: 12,
    strength_k: 1.0,
    total_groups: 24,
};
const DAILY: Thresholds = Thresholds {
    pattern_type: "day_of_week",
    cv_threshold: 0.15,
    epsilon: 0.1,
    min_groups: 5,
    strength_k: 2.0,
    total_groups: 7,
};
const WEEKLY: Thresholds = Thresholds {
    pattern_type: "week_of_year",
    cv_threshold: 0.1,
    epsilon: 0.0,
    min_groups: 4,
    strength_k: 3.0,
    total_groups: 52,
};

fn group_counts<F: Fn(&TelemetryInput) -> u32>(events: &[&TelemetryInput], key: F) -> BTreeMap<u32, u64> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(key(event)).or_insert(0_u64) += 1;
    }
    counts
}

fn evaluate(thresholds: &Thresholds, counts: &BTreeMap<u32, u64>) -> Option<SeasonalityPattern> {
    if counts.len() < thresholds.min_groups {
        return None;
    }
    let means: Vec<f64> = counts.values().map(|count| *count as f64).collect();
    let overall_mean = means.iter().sum::<f64>() / means.len() as f64;
    let cv = coefficient_of_variation(&means);

    let peak_periods: Vec<String> = counts
        .iter()
        .filter(|(_, count)| **count as f64 > overall_mean * (1.0 + thresholds.epsilon))
        .map(|(period, _)| period.to_string())
        .collect();
    let trough_periods: Vec<String> = counts
        .iter()
        .filter(|(_, count)| (**count as f64) < overall_mean * (1.0 - thresholds.epsilon))
        .map(|(period, _)| period.to_string())
        .collect();

    Some(SeasonalityPattern {
        pattern_type: thresholds.pattern_type.to_owned(),
        detected: cv > thresholds.cv_threshold,
        strength: (cv * thresholds.strength_k).min(1.0),
        peak_periods,
        trough_periods,
        confidence: (counts.len() as f64 / thresholds.total_groups as f64).min(1.0),
    })
}

/// Computes whichever of the hour/day/week seasonality patterns have enough
/// distinct groups present in `events`.
#[must_use]
pub fn detect(events: &[&TelemetryInput]) -> Vec<SeasonalityPattern> {
    let hourly = group_counts(events, |event| u32::from(event.latency.start_time.inner().hour()));
    let daily = group_counts(events, |event| event.latency.start_time.inner().weekday().number_days_from_monday() as u32);
    let weekly = group_counts(events, |event| u32::from(event.latency.start_time.inner().iso_week()));

    [evaluate(&HOURLY, &hourly), evaluate(&DAILY, &daily), evaluate(&WEEKLY, &weekly)]
        .into_iter()
        .flatten()
        .collect()
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

    fn event_at(hour: &str) -> TelemetryInput {
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
                start_time: Timestamp::parse(hour).expect("valid"),
                end_time: Timestamp::parse(hour).expect("valid"),
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
    fn too_few_distinct_hours_skips_hourly_pattern() {
        let events = [event_at("2026-07-27T10:00:00Z"), event_at("2026-07-27T10:05:00Z")];
        let refs: Vec<&TelemetryInput> = events.iter().collect();
        let patterns = detect(&refs);
        assert!(patterns.iter().all(|p| p.pattern_type != "hour_of_day"));
    }
}
