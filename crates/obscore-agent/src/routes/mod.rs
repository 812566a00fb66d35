// crates/obscore-agent/src/routes/mod.rs
// ============================================================================
// Module: Routes
// Description: Builds the axum router for whichever AgentKind this process
//              runs, plus the always-mounted health/metrics reads.
// Purpose: A process only ever exposes the routes its kind requires; there
//          is no runtime dispatch on request shape to decide which
//          analytical transformation to run.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! [`build`] is called once from `main`, after [`crate::state::AppState`] is
//! assembled. The `POST` surface mounted depends on `state.kind`; `GET
//! /health` and `GET /metrics` are mounted on every process regardless of
//! kind.

pub mod analyze;
pub mod classify;
pub mod enforce;
pub mod generate;
pub mod reads;

use std::sync::Arc;

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use crate::kind::AgentKind;
use crate::state::AppState;

/// Builds the router for this process, mounting only the `POST` routes its
/// [`AgentKind`] requires.
#[must_use]
pub fn build(state: Arc<AppState>) -> Router {
    let router = match state.kind {
        AgentKind::Classification => Router::new()
            .route("/classify", post(classify::classify_one))
            .route("/classify/batch", post(classify::classify_batch)),
        AgentKind::Enforcement => Router::new()
            .route("/enforce", post(enforce::enforce_one))
            .route("/enforce/batch", post(enforce::enforce_batch))
            .route("/violations", get(reads::violations)),
        AgentKind::UsageAnalysis => Router::new()
            .route("/analyze", post(analyze::analyze_one))
            .route("/analyze/batch", post(analyze::analyze_batch))
            .route("/analysis/:id", get(reads::analysis_by_id)),
        AgentKind::PostMortem => Router::new()
            .route("/generate", post(generate::generate_post_mortem))
            .route("/analysis/:id", get(reads::analysis_by_id)),
        AgentKind::Visualization => {
            Router::new().route("/generate", post(generate::generate_visualization))
        }
    };

    router
        .route("/health", get(reads::health))
        .route("/metrics", get(reads::metrics))
        .with_state(state)
}
