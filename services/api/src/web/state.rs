//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request principal.

use crate::config::Config;
use crate::orchestrator::MoodOrchestrator;
use qalbu_core::ports::{AccountService, SpeechGenerationService};
use std::sync::Arc;
use uuid::Uuid;

/// The storage scope used for everyone when accounts are disabled.
pub const DEMO_OWNER: &str = "demo";

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: MoodOrchestrator,
    pub speech: Arc<dyn SpeechGenerationService>,
    /// `None` in demo mode.
    pub accounts: Option<Arc<dyn AccountService>>,
}

//=========================================================================================
// Principal (Specific to One Request)
//=========================================================================================

/// The caller as established by `require_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Scope of the caller's stores and session.
    pub owner: String,
    pub user_id: Option<Uuid>,
}

impl Principal {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            owner: user_id.to_string(),
            user_id: Some(user_id),
        }
    }

    pub fn demo() -> Self {
        Self {
            owner: DEMO_OWNER.to_string(),
            user_id: None,
        }
    }
}
