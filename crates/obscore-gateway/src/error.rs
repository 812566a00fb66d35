// crates/obscore-gateway/src/error.rs
// ============================================================================
// Module: Gateway Errors
// Description: The error taxonomy raised by the persistence gateway client.
// Purpose: Distinguish transport failure, non-2xx responses, and exhausted
//          retries so callers can map each to the correct response.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// A non-2xx response from the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuvectorError {
    /// HTTP status code returned by the gateway.
    pub status_code: u16,
    /// Response body, or a transport-level description when unavailable.
    pub message: String,
}

impl std::fmt::Display for RuvectorError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "gateway returned {}: {}", self.status_code, self.message)
    }
}

impl std::error::Error for RuvectorError {}

/// Raised by any gateway operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be sent or the connection failed outright.
    #[error("gateway transport failure: {0}")]
    Transport(String),

    /// The gateway responded with a non-2xx status after exhausting
    /// retries (or immediately, for a non-retryable `4xx`).
    #[error(transparent)]
    Status(#[from] RuvectorError),

    /// The response body could not be deserialized.
    #[error("gateway response deserialization failed: {0}")]
    Serialization(String),

    /// Every retry attempt was exhausted without success.
    #[error("gateway retries exhausted after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The final error encountered.
        last: String,
    },
}
