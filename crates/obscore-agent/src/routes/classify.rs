// crates/obscore-agent/src/routes/classify.rs
// ============================================================================
// Module: Classify Routes
// Description: POST /classify and POST /classify/batch for a process
//              running AgentKind::Classification.
// Dependencies: axum, obscore-core, obscore-engines, serde_json
// ============================================================================

//! ## Overview
//! Each call runs one `FailureEvent` through the classification engine,
//! builds and persists its `DecisionEvent`, and returns the classification.
//! The batch variant repeats this per item, in order, collecting a
//! per-item status rather than failing the whole batch on one bad item —
//! unless `fail_fast` is set.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use obscore_core::decision::AnalysisOutput;
use obscore_core::decision::EvidenceRef;
use obscore_core::decision::EvidenceRefType;
use obscore_core::telemetry::FailureEvent;
use serde_json::json;
use serde_json::Value;

use crate::error::error_response;
use crate::error::success_response;
use crate::error::PipelineError;
use crate::pipeline;
use crate::pipeline::RequestContext;
use crate::requests::BatchRequest;
use crate::state::AppState;
use crate::state::Engine;

/// Maximum number of items a batch request may carry.
const MAX_BATCH_ITEMS: usize = 1000;

/// `POST /classify`.
pub async fn classify_one(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
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

/// `POST /classify/batch`.
pub async fn classify_batch(
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

/// Runs one classification item through the full pipeline: schema
/// validation, structural validation, classification, decision building,
/// validation, and persistence.
async fn run_one(state: &AppState, ctx: &mut RequestContext, input: &Value) -> Result<AnalysisOutput, PipelineError> {
    ctx.assert_latency()?;

    state.request_validators.failure_event.validate(input)?;

    let event: FailureEvent = serde_json::from_value(input.clone())
        .map_err(|err| PipelineError::MalformedBody(err.to_string()))?;
    event
        .validate()
        .map_err(|err| PipelineError::Agent(obscore_core::error::AgentError::Validation(err)))?;

    let Engine::Classification(engine) = &state.engine else {
        return Err(PipelineError::Agent(obscore_core::error::AgentError::ConstitutionalViolation(
            "this process is not running AgentKind::Classification".to_owned(),
        )));
    };
    let classification = engine.classify(input);

    let evidence_refs = vec![EvidenceRef {
        ref_type: EvidenceRefType::SpanId,
        ref_value: classification.span_id.clone(),
        timestamp: None,
        source: Some(event.telemetry.provider.as_str().to_owned()),
    }];
    let confidence = classification.confidence;
    let output = AnalysisOutput::FailureClassification(classification);

    let decision_event = pipeline::build_decision_event(state, ctx, input, output.clone(), confidence, evidence_refs)?;
    pipeline::validate_decision_event(state, &decision_event)?;
    pipeline::persist(state, ctx, &decision_event).await?;
    state.metrics.record_decision_persisted();
    pipeline::assert_responded(ctx)?;

    Ok(output)
}
