//! Shared WebSocket adapter state.
//!
//! The entry point and the session depend on driven ports only; the
//! adapter never constructs domain services itself. This keeps the
//! session testable with deterministic doubles.

use std::sync::Arc;

use url::Url;

use crate::domain::ports::{RideEvents, TokenVerifier};

/// Dependency bundle for the WebSocket entry point and sessions.
#[derive(Clone)]
pub struct WsState {
    /// Change feed every session subscribes to on connect.
    pub events: Arc<dyn RideEvents>,
    /// Verifier for the token presented in the `authenticate` frame.
    pub tokens: Arc<dyn TokenVerifier>,
    /// Origins allowed to open a connection.
    pub allowed_origins: Arc<Vec<Url>>,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        events: Arc<dyn RideEvents>,
        tokens: Arc<dyn TokenVerifier>,
        allowed_origins: Vec<Url>,
    ) -> Self {
        Self {
            events,
            tokens,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
