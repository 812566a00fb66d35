// crates/obscore-core/src/guard.rs
// ============================================================================
// Module: Performance Guard
// Description: Per-request counters for cumulative outbound calls and
//              elapsed wall time, aborting the request when either exceeds
//              its configured budget.
// Purpose: Bound the resource cost of a single request by construction.
// Dependencies: std::time
// ============================================================================

//! ## Overview
//! One `PerformanceGuard` is constructed per request (never shared across
//! requests). It is checked before any analytical work and again before
//! each outbound call or batch iteration. Exceeding either budget raises
//! immediately; the pipeline maps this to `PerformanceBoundaryExceeded`.

use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

/// Default per-request latency budget in milliseconds.
pub const DEFAULT_MAX_LATENCY_MS: u64 = 1500;

/// Default per-request outbound call budget.
pub const DEFAULT_MAX_CALLS_PER_RUN: u32 = 2;

/// Raised when a request exceeds its latency or call-count budget.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    /// Elapsed wall time exceeded `max_latency_ms`.
    #[error("latency budget exceeded")]
    LatencyExceeded,
    /// Cumulative call count exceeded `max_calls_per_run`.
    #[error("call budget exceeded")]
    CallBudgetExceeded,
}

/// Per-request performance guard.
///
/// # Invariants
/// - Constructed once per request; never shared across requests.
/// - `assert_call_limit` aborts before the `(N+1)`th outbound call, where `N
///   = max_calls_per_run`.
pub struct PerformanceGuard {
    started_at: Instant,
    max_latency: Duration,
    max_calls_per_run: u32,
    calls_made: u32,
}

impl PerformanceGuard {
    /// Creates a new guard with the given budgets, starting its latency
    /// clock now.
    #[must_use]
    pub fn new(max_latency_ms: u64, max_calls_per_run: u32) -> Self {
        Self {
            started_at: Instant::now(),
            max_latency: Duration::from_millis(max_latency_ms),
            max_calls_per_run,
            calls_made: 0,
        }
    }

    /// Creates a guard using the default budgets.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_LATENCY_MS, DEFAULT_MAX_CALLS_PER_RUN)
    }

    /// Returns the elapsed wall time since construction.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Asserts elapsed wall time is within budget.
    ///
    /// # Errors
    /// Returns [`GuardError::LatencyExceeded`] once the budget has elapsed.
    pub fn assert_latency_limit(&self) -> Result<(), GuardError> {
        if self.elapsed() > self.max_latency {
            return Err(GuardError::LatencyExceeded);
        }
        Ok(())
    }

    /// Asserts that making one more outbound call would not exceed the
    /// budget, then records the call. Call this immediately before each
    /// outbound call or batch iteration, not after.
    ///
    /// # Errors
    /// Returns [`GuardError::CallBudgetExceeded`] before the `(N+1)`th call.
    pub fn assert_call_limit(&mut self) -> Result<(), GuardError> {
        if self.calls_made >= self.max_calls_per_run {
            return Err(GuardError::CallBudgetExceeded);
        }
        self.calls_made += 1;
        Ok(())
    }

    /// Returns the number of calls recorded so far.
    #[must_use]
    pub const fn calls_made(&self) -> u32 {
        self.calls_made
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use super::GuardError;
    use super::PerformanceGuard;

    #[test]
    fn latency_limit_trips_after_budget_elapses() {
        let guard = PerformanceGuard::new(5, 2);
        sleep(Duration::from_millis(20));
        assert_eq!(guard.assert_latency_limit(), Err(GuardError::LatencyExceeded));
    }

    #[test]
    fn latency_limit_passes_within_budget() {
        let guard = PerformanceGuard::new(1000, 2);
        assert_eq!(guard.assert_latency_limit(), Ok(()));
    }

    #[test]
    fn call_limit_aborts_before_n_plus_one_call() {
        let mut guard = PerformanceGuard::new(10_000, 2);
        assert_eq!(guard.assert_call_limit(), Ok(()));
        assert_eq!(guard.assert_call_limit(), Ok(()));
        assert_eq!(guard.assert_call_limit(), Err(GuardError::CallBudgetExceeded));
        assert_eq!(guard.calls_made(), 2);
    }
}
