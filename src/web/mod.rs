//! # HTTP Interaction Endpoint
//!
//! Exposes the registries as an HTTP application for platforms that
//! deliver interactions over webhooks instead of the gateway. The axum
//! router enforces a request-size ceiling before buffering, verifies the
//! ed25519 signature headers, answers pings, and translates payloads into
//! the same events the gateway flow dispatches; the executor's initial
//! response becomes the HTTP response body.

pub mod handlers;
pub mod signature;

pub use handlers::{router, ApiError, InteractionAppState};
pub use signature::SignatureVerifier;
