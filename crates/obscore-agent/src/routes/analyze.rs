// crates/obscore-agent/src/routes/analyze.rs
// ============================================================================
// Module: Analyze Routes
// Description: POST /analyze and POST /analyze/batch for a process running
//              AgentKind::UsageAnalysis.
// Dependencies: axum, obscore-core, obscore-engines, serde_json
// ============================================================================

//! ## Overview
//! Each call aggregates a slice of telemetry events over a time window,
//! builds and persists one `DecisionEvent` carrying the usage pattern
//! analysis, and returns it. Evidence references name every event's
//! `trace_id`, deduplicated.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use obscore_core::decision::AnalysisOutput;
use obscore_core::decision::EvidenceRef;
use obscore_core::decision::EvidenceRefType;
use obscore_core::error::AgentError;
use obscore_engines::UsageRequest;
use serde_json::json;
use serde_json::Value;

use crate::error::error_response;
use crate::error::success_response;
use crate::error::PipelineError;
use crate::pipeline;
use crate::pipeline::RequestContext;
use crate::requests::AnalysisRequest;
use crate::requests::BatchRequest;
use crate::state::AppState;
use crate::state::Engine;

/// Maximum number of items a batch request may carry.
const MAX_BATCH_ITEMS: usize = 1000;

/// `POST /analyze`.
pub async fn analyze_one(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let mut ctx = RequestContext::start(&state);
    state.metrics.record_received();
    match run_one(&state, &mut ctx, &body).await {
        Ok(output) => {
            state.metrics.record_succeeded();
            success_response(&state, &ctx, output)
        }
        Err(err) => {
            state.metrics.record_aborted();
            error_response(&state, &ctx, err)
        }
    }
}

/// `POST /analyze/batch`.
pub async fn analyze_batch(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<BatchRequest<Value>>,
) -> Response {
    let mut ctx = RequestContext::start(&state);
    state.metrics.record_received();

    if batch.items.len() > MAX_BATCH_ITEMS {
        state.metrics.record_aborted();
        return error_response(
            &state,
            &ctx,
            PipelineError::BatchTooLarge { actual: batch.items.len(), limit: MAX_BATCH_ITEMS },
        );
    }

    let mut results = Vec::with_capacity(batch.items.len());
    for item in &batch.items {
        match run_one(&state, &mut ctx, item).await {
            Ok(output) => results.push(json!({"success": true, "data": output})),
            Err(err) => {
                let failed = json!({"success": false, "error": {"code": err.code(), "message": err.to_string()}});
                if batch.fail_fast {
                    state.metrics.record_aborted();
                    results.push(failed);
                    return success_response(
                        &state,
                        &ctx,
                        json!({"items": results, "correlation_id": batch.correlation_id}),
                    );
                }
                results.push(failed);
            }
        }
    }
    state.metrics.record_succeeded();
    success_response(&state, &ctx, json!({"items": results, "correlation_id": batch.correlation_id}))
}

/// Runs one usage-analysis item through the full pipeline: schema
/// validation, window sanity check, aggregation, decision building,
/// validation, and persistence.
async fn run_one(state: &AppState, ctx: &mut RequestContext, input: &Value) -> Result<AnalysisOutput, PipelineError> {
    ctx.assert_latency()?;

    state.request_validators.analysis_request.validate(input)?;

    let request: AnalysisRequest = serde_json::from_value(input.clone())
        .map_err(|err| PipelineError::MalformedBody(err.to_string()))?;

    if request.time_window.start >= request.time_window.end {
        return Err(PipelineError::Agent(AgentError::ConstitutionalViolation(
            "time_window.start must be before time_window.end".to_owned(),
        )));
    }

    let Engine::UsageAnalysis(aggregator) = &state.engine else {
        return Err(PipelineError::Agent(AgentError::ConstitutionalViolation(
            "this process is not running AgentKind::UsageAnalysis".to_owned(),
        )));
    };

    let window = request
        .time_window
        .into_engine_window()
        .map_err(|err| PipelineError::MalformedBody(err.to_string()))?;
    let usage_request = UsageRequest {
        window,
        filters: request.filters.into_engine_filters(),
        options: request.options.into_engine_options(),
    };
    let analysis = aggregator.aggregate(&request.events, &usage_request);

    let trace_ids: BTreeSet<String> =
        request.events.iter().map(|event| event.trace_id.as_str().to_owned()).collect();
    let evidence_refs = trace_ids
        .into_iter()
        .map(|trace_id| EvidenceRef { ref_type: EvidenceRefType::TraceId, ref_value: trace_id, timestamp: None, source: None })
        .collect();

    let confidence = analysis.overall_confidence;
    let output = AnalysisOutput::UsagePatternAnalysis(analysis);

    let decision_event = pipeline::build_decision_event(state, ctx, input, output.clone(), confidence, evidence_refs)?;
    pipeline::validate_decision_event(state, &decision_event)?;
    pipeline::persist(state, ctx, &decision_event).await?;
    state.metrics.record_decision_persisted();
    pipeline::assert_responded(ctx)?;

    Ok(output)
}
