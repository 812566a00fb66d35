// crates/obscore-agent/src/lib.rs
// ============================================================================
// Crate: obscore-agent
// Description: The HTTP process shell around one observation agent — wires
//              startup gating, the analytical engines, the persistence
//              gateway client, and the request pipeline into an axum server.
// Purpose: Every agent kind (classification, enforcement, usage analysis,
//          post-mortem synthesis, visualization) is one build of this crate,
//          configured at startup by which analytical kind it runs.
// Dependencies: axum, obscore-contract, obscore-core, obscore-engines,
//               obscore-gateway, tokio, tower, tracing
// ============================================================================

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod kind;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod requests;
pub mod routes;
pub mod rules;
pub mod state;

pub use error::PipelineError;
pub use kind::AgentKind;
pub use state::AppState;
