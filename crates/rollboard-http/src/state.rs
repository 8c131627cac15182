//! Shared state for the HTTP server.
//!
//! Wraps the RollboardContext so handlers and the WebSocket stream see the
//! same stores and event bus.

use rollboard_core::RollboardContext;
use std::sync::Arc;

/// Shared state available to all HTTP handlers.
#[derive(Clone)]
pub struct SharedState {
    pub context: Arc<RollboardContext>,
}

impl SharedState {
    pub fn new(context: Arc<RollboardContext>) -> Self {
        Self { context }
    }
}
