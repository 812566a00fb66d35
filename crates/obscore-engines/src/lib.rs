// crates/obscore-engines/src/lib.rs
// ============================================================================
// Crate: obscore-engines
// Description: The analytical value of the agent fleet — a priority-ordered
//              rule matcher, a threshold/near-breach/consecutive-breach
//              evaluator, and a time-bucketed statistical aggregator.
// Purpose: Keep the engines pure and synchronous; agents own the I/O.
// Dependencies: bigdecimal, obscore-core, regex, serde_json, time
// ============================================================================

#![forbid(unsafe_code)]

pub mod classification;
pub mod slo;
pub mod usage;

pub use classification::ClassificationEngine;
pub use classification::ClassificationRule;
pub use classification::Condition;
pub use classification::ConditionOperator;
pub use classification::RuleOutput;
pub use slo::SloEvaluator;
pub use usage::UsageAggregator;
pub use usage::UsageFilters;
pub use usage::UsageOptions;
pub use usage::UsageRequest;
