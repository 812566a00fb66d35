// crates/obscore-agent/src/metrics.rs
// ============================================================================
// Module: Process Metrics
// Description: A small set of atomic counters rendered as Prometheus text
//              exposition format for GET /metrics.
// Purpose: Expose request volume and outcome counts without pulling in a
//          full metrics client — the agent fleet's metrics surface is
//          intentionally narrow.
// Dependencies: std::sync::atomic
// ============================================================================

//! ## Overview
//! [`Metrics`] holds one [`AtomicU64`] per counter. Route handlers record
//! through it on every outcome; [`Metrics::render`] formats the current
//! values as Prometheus text exposition format, the shape `GET /metrics`
//! returns verbatim.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Process-wide request and outcome counters.
#[derive(Default)]
pub struct Metrics {
    requests_received: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_aborted: AtomicU64,
    decisions_persisted: AtomicU64,
}

impl Metrics {
    /// Creates a fresh, zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was received.
    pub fn record_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a request reached `Responded`.
    pub fn record_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a request reached `Aborted`.
    pub fn record_aborted(&self) {
        self.requests_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that one `DecisionEvent` was persisted.
    pub fn record_decision_persisted(&self) {
        self.decisions_persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// Renders the current counter values as Prometheus text exposition
    /// format.
    #[must_use]
    pub fn render(&self) -> String {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        format!(
            "# HELP obscore_agent_requests_received_total Requests received.\n\
             # TYPE obscore_agent_requests_received_total counter\n\
             obscore_agent_requests_received_total {}\n\
             # HELP obscore_agent_requests_succeeded_total Requests that reached Responded.\n\
             # TYPE obscore_agent_requests_succeeded_total counter\n\
             obscore_agent_requests_succeeded_total {}\n\
             # HELP obscore_agent_requests_aborted_total Requests that reached Aborted.\n\
             # TYPE obscore_agent_requests_aborted_total counter\n\
             obscore_agent_requests_aborted_total {}\n\
             # HELP obscore_agent_decisions_persisted_total DecisionEvents persisted.\n\
             # TYPE obscore_agent_decisions_persisted_total counter\n\
             obscore_agent_decisions_persisted_total {}\n",
            load(&self.requests_received),
            load(&self.requests_succeeded),
            load(&self.requests_aborted),
            load(&self.decisions_persisted),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Metrics;

    #[test]
    fn render_reflects_recorded_counts() {
        let metrics = Metrics::new();
        metrics.record_received();
        metrics.record_succeeded();
        metrics.record_decision_persisted();
        let text = metrics.render();
        assert!(text.contains("obscore_agent_requests_received_total 1"));
        assert!(text.contains("obscore_agent_requests_succeeded_total 1"));
        assert!(text.contains("obscore_agent_decisions_persisted_total 1"));
        assert!(text.contains("obscore_agent_requests_aborted_total 0"));
    }
}
