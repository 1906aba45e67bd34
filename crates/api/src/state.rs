//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use gemini_brain::GeminiBrain;
use orchestrator::{ChatOrchestrator, IntegrationManager};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Conversation pipeline.
    pub chat: Arc<ChatOrchestrator<GeminiBrain>>,
    /// Integration lifecycle manager.
    pub integrations: Arc<IntegrationManager>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        chat: Arc<ChatOrchestrator<GeminiBrain>>,
        integrations: Arc<IntegrationManager>,
    ) -> Self {
        Self {
            db,
            chat,
            integrations,
        }
    }
}
