//! Application state for the trigger server

use crate::Pipeline;
use std::sync::Arc;

/// Shared state handed to every route handler
///
/// Cloned per request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Pipeline that processes delivered events
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}
