// crates/obscore-agent/src/state.rs
// ============================================================================
// Module: Application State
// Description: Everything a route handler needs, assembled once at startup
//              and shared read-only across every request.
// Purpose: One shared, cloneable handle — no handler reaches into globals.
// Dependencies: obscore-contract, obscore-core, obscore-engines,
//               obscore-gateway, std::sync
// ============================================================================

//! ## Overview
//! `AppState` is built once in `main` after startup gating succeeds, then
//! handed to axum via `Router::with_state`. It carries the frozen startup
//! configuration, the compiled request/decision validators, the one
//! analytical engine this process's [`AgentKind`] requires, the gateway
//! client, and a short-lived read cache for the `GET` routes.

use obscore_contract::DecisionEventValidator;
use obscore_contract::RequestValidators;
use obscore_core::cache::TtlCache;
use obscore_core::cache::DEFAULT_TTL;
use obscore_core::identity::AgentIdentity;
use obscore_core::startup::Config as StartupConfig;
use obscore_engines::ClassificationEngine;
use obscore_engines::SloEvaluator;
use obscore_engines::UsageAggregator;
use obscore_gateway::GatewayClient;
use serde_json::Value;

use crate::kind::AgentKind;
use crate::metrics::Metrics;

/// The one analytical engine an agent process holds, chosen by its
/// [`AgentKind`] at startup. Post-mortem and visualization agents need no
/// standing engine of their own: they synthesize from gateway reads and
/// validated request bodies respectively.
pub enum Engine {
    /// Backs `/classify` and its batch variant.
    Classification(ClassificationEngine),
    /// Backs `/enforce` and its batch variant.
    Enforcement(SloEvaluator),
    /// Backs `/analyze` and its batch variant.
    UsageAnalysis(UsageAggregator),
    /// Backs `/generate` when `AgentKind::PostMortem`.
    PostMortem,
    /// Backs `/generate` when `AgentKind::Visualization`.
    Visualization,
}

/// Shared, read-only application state.
pub struct AppState {
    /// Frozen startup configuration.
    pub config: StartupConfig,
    /// The analytical transformation this process performs.
    pub kind: AgentKind,
    /// This process's identity tuple, duplicated from `config.identity` for
    /// convenient access in route handlers.
    pub identity: AgentIdentity,
    /// Process-lifetime instance identifier, `<agent_name>-<short-uuid>`.
    pub agent_id: String,
    /// Compiled request-shape validators.
    pub request_validators: RequestValidators,
    /// `DecisionEvent` validator pinned to this process's `decision_type`.
    pub decision_validator: DecisionEventValidator,
    /// The one engine this process's kind requires.
    pub engine: Engine,
    /// Client for the shared persistence gateway.
    pub gateway: GatewayClient,
    /// Short-lived cache for `GET /violations` and `GET /analysis/:id`
    /// reads, keyed by the full query string or path.
    pub read_cache: TtlCache<String, Value>,
    /// Process-wide request and outcome counters, rendered by `GET /metrics`.
    pub metrics: Metrics,
}

impl AppState {
    /// Assembles application state from a loaded configuration and the
    /// chosen engine, building the gateway client and compiling every
    /// validator this process needs.
    ///
    /// # Errors
    /// Returns a message naming the first component that failed to build:
    /// the gateway client or either validator.
    pub fn build(
        config: StartupConfig,
        kind: AgentKind,
        classification_rules: Vec<obscore_engines::ClassificationRule>,
    ) -> Result<Self, String> {
        let identity = config.identity.clone();
        let agent_id = format!("{}-{}", identity.agent_name.as_str(), short_instance_suffix());

        let gateway = GatewayClient::builder()
            .service_url(config.gateway.service_url.clone())
            .api_key(config.gateway.api_key.clone())
            .user_agent(format!("{}/{}", identity.agent_name.as_str(), identity.agent_version))
            .pool_size(config.gateway.pool_size)
            .retry_attempts(config.gateway.retry_attempts)
            .retry_delay_ms(config.gateway.retry_delay_ms)
            .max_retry_delay_ms(config.gateway.max_retry_delay_ms)
            .timeout_ms(config.gateway.timeout_ms)
            .health_timeout_ms(config.gateway.health_timeout_ms)
            .build()
            .map_err(|err| err.to_string())?;

        let request_validators = RequestValidators::compile().map_err(|err| err.to_string())?;
        let decision_validator =
            DecisionEventValidator::for_decision_type(kind.decision_type()).map_err(|err| err.to_string())?;

        let engine = match kind {
            AgentKind::Classification => Engine::Classification(ClassificationEngine::new(classification_rules)),
            AgentKind::Enforcement => Engine::Enforcement(SloEvaluator::default()),
            AgentKind::UsageAnalysis => Engine::UsageAnalysis(UsageAggregator::new()),
            AgentKind::PostMortem => Engine::PostMortem,
            AgentKind::Visualization => Engine::Visualization,
        };

        let read_cache = TtlCache::new(DEFAULT_TTL);

        Ok(Self {
            config,
            kind,
            identity,
            agent_id,
            request_validators,
            decision_validator,
            engine,
            gateway,
            read_cache,
            metrics: Metrics::new(),
        })
    }
}

/// A short, non-cryptographic instance suffix distinguishing replicas of the
/// same agent in logs. Not used for any security-relevant purpose.
fn short_instance_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_owned()
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

    use obscore_core::startup::Config as StartupConfig;

    use super::AppState;
    use crate::kind::AgentKind;
    use crate::rules::default_rules;

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
    fn state_builds_from_valid_config() {
        let config = StartupConfig::from_merged_vars(&base_vars()).expect("valid config");
        let state = AppState::build(config, AgentKind::Classification, default_rules()).expect("state builds");
        assert!(state.agent_id.starts_with("failure-classifier-"));
    }
}
