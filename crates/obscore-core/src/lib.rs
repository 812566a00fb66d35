// crates/obscore-core/src/lib.rs
// ============================================================================
// Module: Observation Core
// Description: Shared identity, hashing, caching, and guard primitives used by
//              every observation agent.
// Purpose: Provide the leaf dependency graph every agent composes on top of.
// ============================================================================

//! ## Overview
//! `obscore-core` is the foundation shared by every observation agent: the
//! closed enum domains that make up an agent's constitutional identity, the
//! canonical hasher used for provenance, the data model for telemetry and
//! decision events, and the three runtime guards (TTL cache, performance
//! guard, contract assertions) that bound a request's resource use.
//!
//! Nothing in this crate performs I/O. The gateway client, schema validator,
//! and analytical engines build on top of these types in sibling crates.

#![forbid(unsafe_code)]

/// Closed enum domains and the agent identity tuple.
pub mod identity;

/// Canonical JSON hashing (RFC 8785 + SHA-256).
pub mod hashing;

/// UTC ISO-8601 timestamp wrapper.
pub mod timestamp;

/// Telemetry input and failure event data model.
pub mod telemetry;

/// SLO definitions, metric samples, and historical context.
pub mod slo;

/// Analysis outputs and the DecisionEvent provenance record.
pub mod decision;

/// Read-through TTL cache with absolute per-entry deadlines.
pub mod cache;

/// Per-request performance guard (call count + elapsed time budgets).
pub mod guard;

/// Per-request contract assertion ledger.
pub mod contract;

/// Startup gate: mandatory environment, frozen config, process abort.
pub mod startup;

/// Shared error taxonomy used across every observation-core consumer.
pub mod error;

pub use error::AgentError;
pub use identity::AgentIdentity;
pub use timestamp::Timestamp;
