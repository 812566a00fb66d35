// crates/obscore-core/src/startup.rs
// ============================================================================
// Module: Startup Asserter
// Description: Mandatory-configuration gate producing the frozen Config and
//              AgentIdentity singleton, or a reason to abort the process.
// Purpose: No agent serves a single request without first proving it has
//          everything it needs.
// Dependencies: std::collections
// ============================================================================

//! ## Overview
//! Startup gating happens once, before any listener binds. This module only
//! validates a flattened key/value view of the merged configuration
//! (environment variables layered over an optional TOML file, defaults
//! layered under both) — building that merged view, and checking gateway
//! reachability, are the caller's job (`obscore-agent::config` and
//! `obscore-gateway`, respectively), since neither belongs in a crate that
//! performs no I/O. [`Config::from_merged_vars`] is the pure decision point:
//! given the merged view, produce a frozen [`Config`] or a
//! [`StartupError`] naming exactly what is missing or malformed.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::identity::AgentDomain;
use crate::identity::AgentIdentity;
use crate::identity::AgentName;

/// The environment variable names the Startup Asserter treats as mandatory.
pub const MANDATORY_VARS: &[&str] = &[
    "RUVECTOR_SERVICE_URL",
    "RUVECTOR_API_KEY",
    "AGENT_NAME",
    "AGENT_DOMAIN",
    "AGENT_PHASE",
    "AGENT_LAYER",
];

/// Raised when startup gating fails. Every variant maps to a process exit
/// before any request is served.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// A mandatory variable was absent.
    #[error("missing mandatory variable: {0}")]
    MissingVar(String),

    /// A mandatory variable had the wrong fixed value (e.g. `AGENT_PHASE`
    /// must be `phase1`).
    #[error("variable {name} must be '{expected}', got '{actual}'")]
    FixedValueMismatch {
        /// The variable name.
        name: String,
        /// The required value.
        expected: String,
        /// The value actually supplied.
        actual: String,
    },

    /// `AGENT_VERSION` (or its default) did not match `^\d+\.\d+\.\d+$`.
    #[error("invalid agent_version: {0}")]
    InvalidAgentVersion(String),

    /// The persistence gateway was unreachable at startup. Populated by the
    /// caller after an out-of-band health check; this module never performs
    /// I/O itself.
    #[error("persistence gateway unreachable: {0}")]
    GatewayUnreachable(String),
}

/// Gateway client configuration, frozen at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Base URL of the persistence gateway.
    pub service_url: String,
    /// Bearer token injected on every outbound request.
    pub api_key: String,
    /// Fixed connection pool size.
    pub pool_size: usize,
    /// Maximum total attempts per outbound call.
    pub retry_attempts: u32,
    /// Initial retry backoff, milliseconds.
    pub retry_delay_ms: u64,
    /// Retry backoff cap, milliseconds.
    pub max_retry_delay_ms: u64,
    /// Per-attempt timeout, milliseconds.
    pub timeout_ms: u64,
    /// Health-check timeout, milliseconds.
    pub health_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            api_key: String::new(),
            pool_size: 5,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            max_retry_delay_ms: 10_000,
            timeout_ms: 30_000,
            health_timeout_ms: 5_000,
        }
    }
}

/// Runtime limits beyond the gateway client's own budgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeLimits {
    /// Per-request latency budget, milliseconds.
    pub max_latency_ms: u64,
    /// Per-request outbound call budget.
    pub max_calls_per_run: u32,
    /// Maximum events accepted in a single analysis/batch request.
    pub max_events_per_analysis: u32,
    /// Maximum usage-aggregator time window width, in days.
    pub max_time_window_days: u32,
    /// Whether an agent may emit telemetry about its own operation.
    pub self_observation_enabled: bool,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_latency_ms: crate::guard::DEFAULT_MAX_LATENCY_MS,
            max_calls_per_run: crate::guard::DEFAULT_MAX_CALLS_PER_RUN,
            max_events_per_analysis: 1000,
            max_time_window_days: 90,
            self_observation_enabled: false,
        }
    }
}

/// The frozen, process-scoped configuration produced by a successful
/// startup gate. Never re-read after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The agent's constitutional identity.
    pub identity: AgentIdentity,
    /// Persistence gateway client configuration.
    pub gateway: GatewayConfig,
    /// Runtime resource limits.
    pub limits: RuntimeLimits,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
}

fn get<'a>(vars: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(String::as_str)
}

fn require<'a>(vars: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str, StartupError> {
    get(vars, key).filter(|value| !value.is_empty()).ok_or_else(|| StartupError::MissingVar(key.to_owned()))
}

fn require_fixed<'a>(
    vars: &'a BTreeMap<String, String>,
    key: &str,
    expected: &str,
) -> Result<&'a str, StartupError> {
    let value = require(vars, key)?;
    if value != expected {
        return Err(StartupError::FixedValueMismatch {
            name: key.to_owned(),
            expected: expected.to_owned(),
            actual: value.to_owned(),
        });
    }
    Ok(value)
}

fn parse_or_default<T: std::str::FromStr>(vars: &BTreeMap<String, String>, key: &str, default: T) -> T {
    get(vars, key).and_then(|value| value.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Validates a merged (env-over-file-over-defaults) key/value view and
    /// produces a frozen `Config`, or names the first missing/malformed
    /// mandatory field.
    ///
    /// # Errors
    /// Returns [`StartupError::MissingVar`] for an absent mandatory
    /// variable, [`StartupError::FixedValueMismatch`] for a wrong
    /// `AGENT_PHASE`/`AGENT_LAYER`, or [`StartupError::InvalidAgentVersion`]
    /// for a malformed `AGENT_VERSION`.
    pub fn from_merged_vars(vars: &BTreeMap<String, String>) -> Result<Self, StartupError> {
        let service_url = require(vars, "RUVECTOR_SERVICE_URL")?.to_owned();
        let api_key = require(vars, "RUVECTOR_API_KEY")?.to_owned();
        let agent_name = require(vars, "AGENT_NAME")?.to_owned();
        let agent_domain = require(vars, "AGENT_DOMAIN")?.to_owned();
        require_fixed(vars, "AGENT_PHASE", "phase1")?;
        require_fixed(vars, "AGENT_LAYER", "layer1")?;

        let agent_version = get(vars, "AGENT_VERSION").unwrap_or("0.1.0").to_owned();
        let identity = AgentIdentity::new(
            AgentName::new(agent_name),
            AgentDomain::new(agent_domain),
            agent_version,
        )
        .map_err(StartupError::InvalidAgentVersion)?;

        let gateway = GatewayConfig {
            service_url,
            api_key,
            pool_size: parse_or_default(vars, "RUVECTOR_POOL_SIZE", 5),
            retry_attempts: parse_or_default(vars, "RUVECTOR_RETRY_ATTEMPTS", 3),
            retry_delay_ms: parse_or_default(vars, "RUVECTOR_RETRY_DELAY_MS", 1_000),
            max_retry_delay_ms: parse_or_default(vars, "RUVECTOR_MAX_RETRY_DELAY_MS", 10_000),
            timeout_ms: parse_or_default(vars, "RUVECTOR_TIMEOUT_MS", 30_000),
            health_timeout_ms: parse_or_default(vars, "RUVECTOR_HEALTH_TIMEOUT_MS", 5_000),
        };

        let limits = RuntimeLimits {
            max_latency_ms: parse_or_default(
                vars,
                "MAX_LATENCY_MS",
                crate::guard::DEFAULT_MAX_LATENCY_MS,
            ),
            max_calls_per_run: parse_or_default(
                vars,
                "MAX_CALLS_PER_RUN",
                crate::guard::DEFAULT_MAX_CALLS_PER_RUN,
            ),
            max_events_per_analysis: parse_or_default(vars, "MAX_EVENTS_PER_ANALYSIS", 1000),
            max_time_window_days: parse_or_default(vars, "MAX_TIME_WINDOW_DAYS", 90),
            self_observation_enabled: parse_or_default(vars, "SELF_OBSERVATION_ENABLED", false),
        };

        let bind_addr = get(vars, "SERVER_BIND_ADDR").unwrap_or("0.0.0.0:8080").to_owned();

        Ok(Self { identity, gateway, limits, bind_addr })
    }
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

    use std::collections::BTreeMap;

    use super::Config;
    use super::StartupError;

    fn base_vars() -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("RUVECTOR_SERVICE_URL".to_owned(), "https://gateway.internal".to_owned());
        vars.insert("RUVECTOR_API_KEY".to_owned(), "secret".to_owned());
        vars.insert("AGENT_NAME".to_owned(), "failure-classifier".to_owned());
        vars.insert("AGENT_DOMAIN".to_owned(), "llm-gateway".to_owned());
        vars.insert("AGENT_PHASE".to_owned(), "phase1".to_owned());
        vars.insert("AGENT_LAYER".to_owned(), "layer1".to_owned());
        vars
    }

    #[test]
    fn complete_vars_produce_a_config() {
        let config = Config::from_merged_vars(&base_vars()).expect("valid vars");
        assert_eq!(config.gateway.pool_size, 5);
        assert_eq!(config.limits.max_calls_per_run, 2);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn missing_mandatory_var_is_named() {
        let mut vars = base_vars();
        vars.remove("RUVECTOR_API_KEY");
        let err = Config::from_merged_vars(&vars).unwrap_err();
        assert_eq!(err, StartupError::MissingVar("RUVECTOR_API_KEY".to_owned()));
    }

    #[test]
    fn wrong_phase_is_rejected() {
        let mut vars = base_vars();
        vars.insert("AGENT_PHASE".to_owned(), "phase2".to_owned());
        assert!(matches!(
            Config::from_merged_vars(&vars),
            Err(StartupError::FixedValueMismatch { .. })
        ));
    }

    #[test]
    fn overrides_are_applied() {
        let mut vars = base_vars();
        vars.insert("RUVECTOR_POOL_SIZE".to_owned(), "10".to_owned());
        vars.insert("MAX_CALLS_PER_RUN".to_owned(), "5".to_owned());
        let config = Config::from_merged_vars(&vars).expect("valid vars");
        assert_eq!(config.gateway.pool_size, 10);
        assert_eq!(config.limits.max_calls_per_run, 5);
    }
}
