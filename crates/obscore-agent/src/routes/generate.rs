// crates/obscore-agent/src/routes/generate.rs
// ============================================================================
// Module: Generate Routes
// Description: POST /generate for a process running AgentKind::PostMortem
//              or AgentKind::Visualization.
// Dependencies: axum, obscore-core, serde_json
// ============================================================================

//! ## Overview
//! `/generate` means different things depending on which kind a process
//! runs: a post-mortem process synthesizes a structured incident summary
//! over a window of telemetry and prior SLO violations; a visualization
//! process emits a validated chart spec. Both write exactly one
//! `DecisionEvent`, so both share the same build/validate/persist tail as
//! every other route.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use obscore_core::decision::AnalysisOutput;
use obscore_core::decision::EvidenceRef;
use obscore_core::decision::EvidenceRefType;
use obscore_core::decision::PostMortemReport;
use obscore_core::decision::VisualizationSpec;
use obscore_core::error::AgentError;
use serde_json::Value;

use crate::error::error_response;
use crate::error::success_response;
use crate::error::PipelineError;
use crate::pipeline;
use crate::pipeline::RequestContext;
use crate::requests::PostMortemRequest;
use crate::requests::VisualizationRequest;
use crate::state::AppState;
use crate::state::Engine;

/// `POST /generate` on a post-mortem process.
pub async fn generate_post_mortem(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let mut ctx = RequestContext::start(&state);
    state.metrics.record_received();
    match run_post_mortem(&state, &mut ctx, &body).await {
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

/// `POST /generate` on a visualization process.
pub async fn generate_visualization(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let mut ctx = RequestContext::start(&state);
    state.metrics.record_received();
    match run_visualization(&state, &mut ctx, &body).await {
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

/// Runs one post-mortem synthesis through the full pipeline: structural
/// validation, summary synthesis, decision building, validation, and
/// persistence.
async fn run_post_mortem(
    state: &AppState,
    ctx: &mut RequestContext,
    input: &Value,
) -> Result<AnalysisOutput, PipelineError> {
    ctx.assert_latency()?;

    if !matches!(state.engine, Engine::PostMortem) {
        return Err(PipelineError::Agent(AgentError::ConstitutionalViolation(
            "this process is not running AgentKind::PostMortem".to_owned(),
        )));
    }

    let request: PostMortemRequest =
        serde_json::from_value(input.clone()).map_err(|err| PipelineError::MalformedBody(err.to_string()))?;
    if request.events.is_empty() {
        return Err(PipelineError::Agent(AgentError::ConstitutionalViolation(
            "post-mortem synthesis requires at least one contributing event".to_owned(),
        )));
    }

    let contributing_spans: Vec<String> =
        request.events.iter().map(|event| event.span_id.as_str().to_owned()).collect();
    let sample_size = request.events.len() as u64;
    let confidence = 1.0 - (-0.001 * sample_size as f64).exp();

    let summary = format!(
        "{} contributing event(s) across {} span(s), {} prior SLO violation(s)",
        request.events.len(),
        contributing_spans.len(),
        request.slo_violation_ids.len(),
    );

    let report = PostMortemReport {
        summary,
        contributing_spans: contributing_spans.clone(),
        contributing_slo_ids: request.slo_violation_ids.clone(),
        confidence,
    };

    let mut evidence_refs: Vec<EvidenceRef> = contributing_spans
        .into_iter()
        .map(|span_id| EvidenceRef { ref_type: EvidenceRefType::SpanId, ref_value: span_id, timestamp: None, source: None })
        .collect();
    evidence_refs.extend(request.slo_violation_ids.into_iter().map(|slo_id| EvidenceRef {
        ref_type: EvidenceRefType::External,
        ref_value: slo_id,
        timestamp: None,
        source: Some("slo_enforcement".to_owned()),
    }));

    let output = AnalysisOutput::PostMortemReport(report);

    let decision_event = pipeline::build_decision_event(state, ctx, input, output.clone(), confidence, evidence_refs)?;
    pipeline::validate_decision_event(state, &decision_event)?;
    pipeline::persist(state, ctx, &decision_event).await?;
    state.metrics.record_decision_persisted();
    pipeline::assert_responded(ctx)?;

    Ok(output)
}

/// Runs one visualization-spec request through the full pipeline: schema
/// validation, spec assembly, decision building, validation, and
/// persistence.
async fn run_visualization(
    state: &AppState,
    ctx: &mut RequestContext,
    input: &Value,
) -> Result<AnalysisOutput, PipelineError> {
    ctx.assert_latency()?;

    state.request_validators.visualization_request.validate(input)?;

    let request: VisualizationRequest =
        serde_json::from_value(input.clone()).map_err(|err| PipelineError::MalformedBody(err.to_string()))?;

    if !matches!(state.engine, Engine::Visualization) {
        return Err(PipelineError::Agent(AgentError::ConstitutionalViolation(
            "this process is not running AgentKind::Visualization".to_owned(),
        )));
    }

    let spec_body = request.options.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    let spec = VisualizationSpec { chart_type: request.chart_type.clone(), spec: spec_body };
    let evidence_refs = vec![EvidenceRef {
        ref_type: EvidenceRefType::External,
        ref_value: request.data_ref,
        timestamp: None,
        source: Some(request.chart_type),
    }];

    let output = AnalysisOutput::VisualizationSpec(spec);

    let decision_event = pipeline::build_decision_event(state, ctx, input, output.clone(), 1.0, evidence_refs)?;
    pipeline::validate_decision_event(state, &decision_event)?;
    pipeline::persist(state, ctx, &decision_event).await?;
    state.metrics.record_decision_persisted();
    pipeline::assert_responded(ctx)?;

    Ok(output)
}
