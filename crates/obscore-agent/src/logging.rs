// crates/obscore-agent/src/logging.rs
// ============================================================================
// Module: Structured Logging
// Description: Process-wide tracing-subscriber initialization emitting
//              newline-delimited JSON.
// Purpose: Every log line an agent emits is machine-parseable, carrying
//          execution_ref/agent_name/route context via span fields rather
//          than string interpolation.
// Dependencies: tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! Initialization happens once, before startup gating runs, so even a
//! startup abort is logged structurally. [`init`] installs a JSON formatter
//! reading its filter directive from `RUST_LOG`, defaulting to `info` when
//! unset.

use tracing_subscriber::EnvFilter;

/// Default filter directive applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Installs the process-wide JSON tracing subscriber.
///
/// # Panics
/// Panics if a global subscriber has already been installed — this must be
/// called exactly once, at the very start of `main`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(true)
        .with_current_span(true)
        .init();
}
