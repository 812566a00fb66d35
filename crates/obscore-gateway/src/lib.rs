// crates/obscore-gateway/src/lib.rs
// ============================================================================
// Crate: obscore-gateway
// Description: Async client for the shared persistence gateway.
// Purpose: The one permitted path from an agent to durable storage — no
//          agent talks to a database directly.
// Dependencies: obscore-core, reqwest, tokio, tracing
// ============================================================================

#![forbid(unsafe_code)]

pub mod client;
pub mod error;

pub use client::GatewayClient;
pub use client::GatewayClientBuilder;
pub use error::GatewayError;
pub use error::RuvectorError;
