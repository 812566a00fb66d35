// crates/obscore-engines/src/usage/bucket.rs
// ============================================================================
// Module: Time Bucketing
// Description: Splits a time window into fixed-width buckets and folds
//              telemetry events into per-bucket counters.
// Dependencies: obscore-core, serde
// ============================================================================

use std::collections::BTreeSet;

use obscore_core::telemetry::TelemetryInput;
use obscore_core::timestamp::Timestamp;
use serde::Serialize;

/// Bucket width, fixed for the whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Week,
    /// Approximated as 30 fixed-width days; calendar months are not
    /// themselves fixed-width.
    Month,
}

impl Granularity {
    #[must_use]
    pub const fn width_ms(self) -> i64 {
        match self {
            Self::Minute => 60_000,
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
            Self::Week => 604_800_000,
            Self::Month => 2_592_000_000,
        }
    }
}

/// The aggregation window: `[start, end)` sliced into `granularity`-wide
/// buckets.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
    pub granularity: Granularity,
}

impl TimeWindow {
    /// Number of fixed-width buckets covering `[start, end)`, rounded up.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        let span = self.end.millis_since(self.start).max(0);
        let width = self.granularity.width_ms();
        usize::try_from(span.div_ceil(width).max(1)).unwrap_or(usize::MAX)
    }
}

/// One bucket's folded counters, reported even when empty.
#[derive(Debug, Clone, Serialize)]
pub struct BucketStats {
    pub bucket_start: Timestamp,
    pub bucket_end: Timestamp,
    pub request_count: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub avg_latency_ms: f64,
    pub error_count: u64,
    pub unique_users: u64,
    pub unique_sessions: u64,
}

struct BucketAccumulator {
    request_count: u64,
    total_tokens: u64,
    total_cost_usd: f64,
    total_latency_ms: u64,
    error_count: u64,
    users: BTreeSet<String>,
    sessions: BTreeSet<String>,
}

impl BucketAccumulator {
    fn new() -> Self {
        Self {
            request_count: 0,
            total_tokens: 0,
            total_cost_usd: 0.0,
            total_latency_ms: 0,
            error_count: 0,
            users: BTreeSet::new(),
            sessions: BTreeSet::new(),
        }
    }

    fn finish(self, bucket_start: Timestamp, bucket_end: Timestamp) -> BucketStats {
        let avg_latency_ms = if self.request_count == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.request_count as f64
        };
        BucketStats {
            bucket_start,
            bucket_end,
            request_count: self.request_count,
            total_tokens: self.total_tokens,
            total_cost_usd: self.total_cost_usd,
            avg_latency_ms,
            error_count: self.error_count,
            unique_users: self.users.len() as u64,
            unique_sessions: self.sessions.len() as u64,
        }
    }
}

/// Folds `events` into `window.bucket_count()` fixed-width buckets. Events
/// whose `latency.start_time` falls outside `[start, end)` are dropped;
/// callers are expected to have already applied any dimension filters.
#[must_use]
pub fn bucket_events(events: &[&TelemetryInput], window: &TimeWindow) -> Vec<BucketStats> {
    let bucket_count = window.bucket_count();
    let width = window.granularity.width_ms();
    let mut accumulators: Vec<BucketAccumulator> =
        (0..bucket_count).map(|_| BucketAccumulator::new()).collect();

    for event in events {
        let offset = event.latency.start_time.millis_since(window.start);
        if offset < 0 {
            continue;
        }
        let index = (offset / width) as usize;
        let Some(accumulator) = accumulators.get_mut(index) else { continue };

        accumulator.request_count += 1;
        if let Some(usage) = event.token_usage {
            accumulator.total_tokens += usage.total;
        }
        if let Some(cost) = event.cost {
            accumulator.total_cost_usd += cost.amount_usd;
        }
        accumulator.total_latency_ms += event.latency.total_ms;
        if matches!(event.status, obscore_core::telemetry::CallStatus::Error) {
            accumulator.error_count += 1;
        }
        if let Some(user) = &event.metadata.user_id {
            accumulator.users.insert(user.clone());
        }
        if let Some(session) = &event.metadata.session_id {
            accumulator.sessions.insert(session.clone());
        }
    }

    accumulators
        .into_iter()
        .enumerate()
        .map(|(index, accumulator)| {
            let bucket_start =
                Timestamp::new(window.start.inner() + time::Duration::milliseconds(index as i64 * width));
            let bucket_end = Timestamp::new(bucket_start.inner() + time::Duration::milliseconds(width));
            accumulator.finish(bucket_start, bucket_end)
        })
        .collect()
}
