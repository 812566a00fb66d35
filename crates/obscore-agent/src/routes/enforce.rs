// crates/obscore-agent/src/routes/enforce.rs
// ============================================================================
// Module: Enforce Routes
// Description: POST /enforce and POST /enforce/batch for a process running
//              AgentKind::Enforcement.
// Dependencies: axum, obscore-core, obscore-engines, serde_json, time
// ============================================================================

//! ## Overview
//! Each call evaluates a set of SLO definitions against a set of metric
//! samples, builds and persists one `DecisionEvent` carrying the
//! enforcement result, and returns it. Evidence references point at the
//! violated SLO ids, or the first evaluated SLO when nothing was violated.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use obscore_core::decision::AnalysisOutput;
use obscore_core::decision::EvidenceRef;
use obscore_core::decision::EvidenceRefType;
use obscore_core::error::AgentError;
use obscore_core::timestamp::Timestamp;
use serde_json::json;
use serde_json::Value;

use crate::error::error_response;
use crate::error::success_response;
use crate::error::PipelineError;
use crate::pipeline;
use crate::pipeline::RequestContext;
use crate::requests::BatchRequest;
use crate::requests::SloEnforcementRequest;
use crate::state::AppState;
use crate::state::Engine;

/// Maximum number of items a batch request may carry.
const MAX_BATCH_ITEMS: usize = 1000;

/// `POST /enforce`.
pub async fn enforce_one(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
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

/// `POST /enforce/batch`.
pub async fn enforce_batch(
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

/// Runs one SLO enforcement item through the full pipeline: schema
/// validation, evaluation, decision building, validation, and
/// persistence.
async fn run_one(state: &AppState, ctx: &mut RequestContext, input: &Value) -> Result<AnalysisOutput, PipelineError> {
    ctx.assert_latency()?;

    state.request_validators.slo_enforcement_request.validate(input)?;

    let request: SloEnforcementRequest = serde_json::from_value(input.clone())
        .map_err(|err| PipelineError::MalformedBody(err.to_string()))?;

    let Engine::Enforcement(evaluator) = &state.engine else {
        return Err(PipelineError::Agent(AgentError::ConstitutionalViolation(
            "this process is not running AgentKind::Enforcement".to_owned(),
        )));
    };
    let now = Timestamp::new(time::OffsetDateTime::now_utc());
    let result = evaluator.evaluate(
        &request.slo_definitions,
        &request.metrics,
        request.historical_context.as_ref(),
        now,
    );

    let evidence_refs = if result.violations.is_empty() {
        request
            .slo_definitions
            .first()
            .map(|def| EvidenceRef {
                ref_type: EvidenceRefType::MetricId,
                ref_value: def.slo_id.as_str().to_owned(),
                timestamp: Some(now),
                source: None,
            })
            .into_iter()
            .collect()
    } else {
        result
            .violations
            .iter()
            .map(|violation| EvidenceRef {
                ref_type: EvidenceRefType::MetricId,
                ref_value: violation.slo_id.as_str().to_owned(),
                timestamp: Some(now),
                source: None,
            })
            .collect()
    };

    let confidence =
        result.violations.iter().map(|violation| violation.confidence).fold(1.0_f64, f64::min);
    let output = AnalysisOutput::EnforcementResult(result);

    let decision_event = pipeline::build_decision_event(state, ctx, input, output.clone(), confidence, evidence_refs)?;
    pipeline::validate_decision_event(state, &decision_event)?;
    pipeline::persist(state, ctx, &decision_event).await?;
    state.metrics.record_decision_persisted();
    pipeline::assert_responded(ctx)?;

    Ok(output)
}
