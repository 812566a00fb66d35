// crates/obscore-agent/src/kind.rs
// ============================================================================
// Module: Agent Kind
// Description: The single analytical transformation a running process
//              performs, selected once at startup from `AGENT_KIND`.
// Purpose: Each agent receives one kind of telemetry and performs one
//          analytical transformation; `AgentKind` is the process-lifetime
//          switch that picks which routes, schema, and decision_type apply.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A process never serves more than one [`AgentKind`] — there is no request
//! carrying its own kind, and no runtime branching on body shape to decide
//! what a request means. The routes a process mounts, the request schema it
//! validates against, and the `decision_type`/`event_type` literals it emits
//! are all fixed functions of the kind chosen at startup.

use std::fmt;

use thiserror::Error;

/// The five analytical transformations an observation agent may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Classifies a failed call into category/severity/cause.
    Classification,
    /// Evaluates metric samples against SLO definitions.
    Enforcement,
    /// Aggregates usage statistics over a telemetry window.
    UsageAnalysis,
    /// Synthesizes a post-mortem summary over a telemetry window.
    PostMortem,
    /// Emits a validated visualization spec.
    Visualization,
}

/// Raised when `AGENT_KIND` is absent or names an unrecognized kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid AGENT_KIND '{0}': must be one of classification, enforcement, usage_analysis, post_mortem, visualization")]
pub struct InvalidAgentKind(pub String);

impl AgentKind {
    /// Parses the `AGENT_KIND` environment variable value.
    ///
    /// # Errors
    /// Returns [`InvalidAgentKind`] if `value` does not name a known kind.
    pub fn parse(value: &str) -> Result<Self, InvalidAgentKind> {
        match value {
            "classification" => Ok(Self::Classification),
            "enforcement" => Ok(Self::Enforcement),
            "usage_analysis" => Ok(Self::UsageAnalysis),
            "post_mortem" => Ok(Self::PostMortem),
            "visualization" => Ok(Self::Visualization),
            other => Err(InvalidAgentKind(other.to_owned())),
        }
    }

    /// Returns the `decision_type` literal this kind writes on every
    /// `DecisionEvent`.
    #[must_use]
    pub const fn decision_type(self) -> &'static str {
        match self {
            Self::Classification => "failure_classification",
            Self::Enforcement => "slo_enforcement",
            Self::UsageAnalysis => "usage_pattern_analysis",
            Self::PostMortem => "post_mortem_synthesis",
            Self::Visualization => "visualization_spec",
        }
    }

    /// Returns the free-form `event_type` tag this kind writes.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::Classification => "failure_signal",
            Self::Enforcement => "slo_violation_detected",
            Self::UsageAnalysis => "usage_pattern_detected",
            Self::PostMortem => "incident_synthesized",
            Self::Visualization => "visualization_spec_emitted",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classification => "classification",
            Self::Enforcement => "enforcement",
            Self::UsageAnalysis => "usage_analysis",
            Self::PostMortem => "post_mortem",
            Self::Visualization => "visualization",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AgentKind;

    #[test]
    fn parses_every_declared_kind() {
        assert_eq!(AgentKind::parse("classification"), Ok(AgentKind::Classification));
        assert_eq!(AgentKind::parse("enforcement"), Ok(AgentKind::Enforcement));
        assert_eq!(AgentKind::parse("usage_analysis"), Ok(AgentKind::UsageAnalysis));
        assert_eq!(AgentKind::parse("post_mortem"), Ok(AgentKind::PostMortem));
        assert_eq!(AgentKind::parse("visualization"), Ok(AgentKind::Visualization));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(AgentKind::parse("bogus").is_err());
    }

    #[test]
    fn decision_type_is_stable_per_kind() {
        assert_eq!(AgentKind::Classification.decision_type(), "failure_classification");
        assert_eq!(AgentKind::Visualization.decision_type(), "visualization_spec");
    }
}
