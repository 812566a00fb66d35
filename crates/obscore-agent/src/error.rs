// crates/obscore-agent/src/error.rs
// ============================================================================
// Module: Pipeline Error
// Description: The single error type every route handler returns, and its
//              mapping onto the wire error envelope and HTTP status.
// Purpose: Centralize the one place that knows both the error taxonomy and
//          HTTP, so no handler hand-rolls a status code.
// Dependencies: axum, obscore-contract, obscore-core, obscore-gateway, serde_json
// ============================================================================

//! ## Overview
//! [`obscore_core::error::AgentError`] carries no HTTP opinion; this module
//! is the only place that converts it into one. Route handlers map their
//! own `Result<_, PipelineError>` through [`error_response`] at the error
//! boundary, which renders the `{success: false, error: {code, message},
//! metadata}` envelope with the correct status for callers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use obscore_contract::ValidationError;
use obscore_core::error::AgentError;
use obscore_core::identity::ExecutionRef;
use obscore_gateway::GatewayError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::pipeline::RequestContext;
use crate::state::AppState;

/// The error a route handler or pipeline stage can raise, covering every
/// case beyond what `AgentError` alone distinguishes: request parsing,
/// not-found reads, and batch size limits.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Failure at any pipeline stage, with a known agent-error kind.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// The request body failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The persistence gateway client reported a failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The request body was not valid JSON, or did not match the expected
    /// shape at the JSON level (before schema validation ever ran).
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// A batch request exceeded the maximum item count.
    #[error("batch of {actual} items exceeds the maximum of {limit}")]
    BatchTooLarge {
        /// Items actually submitted.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// A read route found no resource at the given identifier.
    #[error("no resource found for {0}")]
    NotFound(String),

    /// An unsupported HTTP method was used against a known path.
    #[error("method not allowed")]
    MethodNotAllowed,
}

/// Metadata carried on every response, success or error, tying it back to
/// its request.
#[derive(Debug, Serialize)]
pub struct ResponseMetadata {
    /// This request's unique execution reference.
    pub execution_ref: ExecutionRef,
    /// Wall-clock time spent processing this request.
    pub processing_time_ms: u64,
    /// This process's instance identifier.
    pub agent_id: String,
    /// This process's semantic version.
    pub agent_version: String,
}

impl ResponseMetadata {
    /// Builds response metadata from the current request context and
    /// state, measuring elapsed time from the context's guard.
    #[must_use]
    pub fn from_context(state: &AppState, ctx: &RequestContext) -> Self {
        Self {
            execution_ref: ctx.execution_ref,
            processing_time_ms: u64::try_from(ctx.guard.elapsed().as_millis()).unwrap_or(u64::MAX),
            agent_id: state.agent_id.clone(),
            agent_version: state.identity.agent_version.clone(),
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Always `false`.
    success: bool,
    /// The error's code and message.
    error: ErrorDetail,
    /// Request-scoped response metadata.
    metadata: ResponseMetadata,
}

/// The `code`/`message` pair carried by an error response.
#[derive(Debug, Serialize)]
struct ErrorDetail {
    /// Stable, machine-readable error code.
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Wire shape of a successful response.
#[derive(Debug, Serialize)]
struct SuccessBody<T: Serialize> {
    /// Always `true`.
    success: bool,
    /// The analytical result.
    data: T,
    /// Request-scoped response metadata.
    metadata: ResponseMetadata,
}

/// Renders `data` as the full `{success, data, metadata}` envelope every
/// successful analytical response carries.
#[must_use]
pub fn success_response<T: Serialize>(state: &AppState, ctx: &RequestContext, data: T) -> Response {
    let body = SuccessBody { success: true, data, metadata: ResponseMetadata::from_context(state, ctx) };
    tracing::info!(
        execution_ref = %ctx.execution_ref,
        status = StatusCode::OK.as_u16(),
        processing_time_ms = body.metadata.processing_time_ms,
        "request completed"
    );
    (StatusCode::OK, Json(body)).into_response()
}

/// Renders `err` as the full `{success, error, metadata}` envelope, tying
/// the response back to `ctx`'s execution reference. Route handlers call
/// this at their error boundary rather than relying on a plain
/// `IntoResponse` conversion, since the envelope requires request-scoped
/// metadata `PipelineError` alone does not carry.
#[must_use]
pub fn error_response(state: &AppState, ctx: &RequestContext, err: PipelineError) -> Response {
    let status = err.status();
    let body = ErrorBody {
        success: false,
        error: ErrorDetail { code: err.code(), message: err.to_string() },
        metadata: ResponseMetadata::from_context(state, ctx),
    };
    tracing::warn!(
        execution_ref = %ctx.execution_ref,
        status = status.as_u16(),
        processing_time_ms = body.metadata.processing_time_ms,
        code = %body.error.code,
        "request completed"
    );
    (status, Json(body)).into_response()
}

/// Renders a gateway failure surfacing from a read route (`/violations`,
/// `/analysis/:id`), which runs outside the write pipeline and so has no
/// [`RequestContext`] to attach response metadata to.
#[must_use]
pub fn gateway_read_error(err: GatewayError) -> Response {
    let pipeline_err = PipelineError::Gateway(err);
    let status = pipeline_err.status();
    let body = ErrorDetail { code: pipeline_err.code(), message: pipeline_err.to_string() };
    tracing::warn!(status = status.as_u16(), code = %body.code, "read route failed");
    (status, Json(json!({"success": false, "error": body}))).into_response()
}

impl PipelineError {
    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Agent(err) => err.code().to_owned(),
            Self::Validation(_) => "validation_error".to_owned(),
            Self::Gateway(GatewayError::Transport(_) | GatewayError::RetriesExhausted { .. }) => {
                "persistence_unavailable".to_owned()
            }
            Self::Gateway(_) => "persistence_error".to_owned(),
            Self::MalformedBody(_) => "malformed_body".to_owned(),
            Self::BatchTooLarge { .. } => "batch_too_large".to_owned(),
            Self::NotFound(_) => "not_found".to_owned(),
            Self::MethodNotAllowed => "method_not_allowed".to_owned(),
        }
    }

    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Agent(AgentError::Validation(_)) | Self::Validation(_) | Self::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Agent(AgentError::ConstitutionalViolation(_)) | Self::BatchTooLarge { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Agent(AgentError::PerformanceBoundaryExceeded(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Agent(
                AgentError::Persistence(_)
                | AgentError::ContractViolation(_)
                | AgentError::HashingFailed(_)
                | AgentError::StartupAssertionFailed(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(GatewayError::Status(status)) if status.status_code < 500 => {
                StatusCode::BAD_GATEWAY
            }
            Self::Gateway(GatewayError::Transport(_) | GatewayError::RetriesExhausted { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use obscore_core::error::AgentError;

    use super::PipelineError;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = PipelineError::Agent(AgentError::Validation("x".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn constitutional_violation_maps_to_unprocessable_entity() {
        let err = PipelineError::Agent(AgentError::ConstitutionalViolation("x".into()));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn performance_boundary_maps_to_gateway_timeout() {
        let err = PipelineError::Agent(AgentError::PerformanceBoundaryExceeded("x".into()));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(PipelineError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn method_not_allowed_maps_to_405() {
        assert_eq!(PipelineError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn batch_too_large_maps_to_422() {
        let err = PipelineError::BatchTooLarge { actual: 2000, limit: 1000 };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
