// crates/obscore-agent/src/main.rs
// ============================================================================
// Binary: obscore-agent
// Description: Process entry point — installs logging, gates startup,
//              assembles application state, and serves this process's
//              AgentKind over HTTP.
// Purpose: A single binary, one build per deployed agent kind chosen by
//          AGENT_KIND; no subcommands, no runtime dispatch on request shape.
// Dependencies: axum, obscore-agent, tokio
// ============================================================================

//! ## Overview
//! Startup happens in one strict order: install logging, load the merged
//! configuration, build application state, bind the listener. Any failure
//! before the listener binds logs exactly one structured `agent_abort` line
//! and exits non-zero — no partial server ever starts.

use std::process::ExitCode;
use std::sync::Arc;

use obscore_agent::logging;
use obscore_agent::routes;
use obscore_agent::state::AppState;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    logging::init();

    let loaded = match obscore_agent::config::load() {
        Ok(loaded) => loaded,
        Err(err) => return abort("config_load_failed", &err.to_string()),
    };

    let state = match AppState::build(loaded.startup, loaded.kind, loaded.classification_rules) {
        Ok(state) => state,
        Err(err) => return abort("state_build_failed", &err),
    };

    let bind_addr = state.config.bind_addr.clone();
    let agent_kind = state.kind;
    let app = routes::build(Arc::new(state));

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => return abort("listener_bind_failed", &err.to_string()),
    };

    tracing::info!(bind_addr = %bind_addr, agent_kind = %agent_kind, "agent listening");

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        return abort("server_failed", &err.to_string());
    }

    ExitCode::SUCCESS
}

/// Logs exactly one structured abort line and returns a non-zero exit code.
/// Called only before any listener has bound.
fn abort(reason: &str, detail: &str) -> ExitCode {
    tracing::error!(reason, detail, "agent_abort");
    ExitCode::FAILURE
}

/// Resolves once the process receives a termination signal, letting
/// in-flight requests finish before the listener stops accepting new ones.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            return;
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
