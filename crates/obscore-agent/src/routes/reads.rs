// crates/obscore-agent/src/routes/reads.rs
// ============================================================================
// Module: Read Routes
// Description: GET /violations, GET /analysis/:id, GET /health, and
//              GET /metrics.
// Dependencies: axum, obscore-core, obscore-gateway, serde_json
// ============================================================================

//! ## Overview
//! `/violations` and `/analysis/:id` are read-through the persistence
//! gateway, memoized in the process's short-lived TTL cache. `/health` and
//! `/metrics` never touch the gateway's decision-event store; `/health`
//! checks gateway reachability, and `/metrics` renders this process's own
//! counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use obscore_core::identity::ExecutionRef;
use serde_json::json;
use uuid::Uuid;

use crate::state::AppState;

/// `GET /violations`. Query parameters are forwarded to the gateway's
/// decision-event read, filtered to this process's `decision_type`.
pub async fn violations(State(state): State<Arc<AppState>>, Query(params): Query<BTreeMap<String, String>>) -> Response {
    read_through(&state, "violations", &params).await
}

/// Cache key and gateway query shared by every read route: this process's
/// `decision_type` plus the caller's own query parameters, in sorted order
/// so the same logical query always hits the same cache entry.
async fn read_through(state: &AppState, route: &str, params: &BTreeMap<String, String>) -> Response {
    let mut query: Vec<(&str, &str)> = vec![("decision_type", state.kind.decision_type())];
    query.extend(params.iter().map(|(key, value)| (key.as_str(), value.as_str())));

    let cache_key = format!(
        "{route}?{}",
        query.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
    );
    if let Some(cached) = state.read_cache.get(&cache_key) {
        return (StatusCode::OK, Json(json!({"success": true, "data": cached}))).into_response();
    }

    match state.gateway.get_decisions(&query).await {
        Ok(decisions) => {
            let value = json!({"items": decisions});
            state.read_cache.put(cache_key, value.clone());
            (StatusCode::OK, Json(json!({"success": true, "data": value}))).into_response()
        }
        Err(err) => crate::error::gateway_read_error(err).into_response(),
    }
}

/// `GET /analysis/:id`. `id` is the `DecisionEvent`'s `execution_ref`.
pub async fn analysis_by_id(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let Ok(uuid) = Uuid::parse_str(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": {"code": "not_found", "message": format!("no resource found for {id}")}})),
        )
            .into_response();
    };
    let execution_ref = ExecutionRef::from_uuid(uuid);
    let cache_key = format!("analysis/{execution_ref}");

    if let Some(cached) = state.read_cache.get(&cache_key) {
        return (StatusCode::OK, Json(json!({"success": true, "data": cached}))).into_response();
    }

    match state.gateway.get_decision_by_ref(execution_ref).await {
        Ok(Some(decision)) => {
            state.read_cache.put(cache_key, decision.clone());
            (StatusCode::OK, Json(json!({"success": true, "data": decision}))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": {"code": "not_found", "message": format!("no resource found for {id}")}})),
        )
            .into_response(),
        Err(err) => crate::error::gateway_read_error(err).into_response(),
    }
}

/// `GET /health`. `200` when the gateway is reachable, `503` otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.gateway.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "healthy"}))).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "degraded", "reason": err.to_string()})),
        )
            .into_response(),
    }
}

/// `GET /metrics`. Prometheus text exposition format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, [("content-type", "text/plain; version=0.0.4")], state.metrics.render()).into_response()
}

