//! services/api/src/orchestrator.rs
//!
//! Sequences a mood selection: guard against a second in-flight request,
//! journal the mood, generate content, and settle the owner's pipeline state.

use std::collections::HashMap;
use std::sync::Arc;

use qalbu_core::domain::{HealingContent, MoodLog, MoodType};
use qalbu_core::ports::{ContentGenerationService, KeyValueStore, PortError, PortResult};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::stores::{FavoritesStore, MoodHistoryStore};

const FALLBACK_LOADING_MESSAGE: &str = "Sedang menyiapkan penawar hati...";

//=========================================================================================
// Session State
//=========================================================================================

/// Where an owner's content request currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Requesting {
        mood: MoodType,
    },
    Succeeded {
        mood: MoodType,
        content: Arc<HealingContent>,
    },
    Failed {
        mood: MoodType,
        message: String,
        retryable: bool,
    },
}

impl PipelineState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, PipelineState::Requesting { .. })
    }
}

/// One owner's view of the app: the selected mood and the pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodSession {
    pub selected_mood: Option<MoodType>,
    pub state: PipelineState,
}

impl Default for MoodSession {
    fn default() -> Self {
        Self {
            selected_mood: None,
            state: PipelineState::Idle,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("A content request is already in progress")]
    RequestInFlight,
    #[error("No mood has been selected yet")]
    NoMoodSelected,
}

/// The result of a selection or refresh.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub session: MoodSession,
    /// The journal entry created for a selection. Absent on refresh, or when
    /// journaling failed.
    pub log: Option<MoodLog>,
    /// Set when the mood could not be journaled; the content request still ran.
    pub warning: Option<String>,
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

#[derive(Clone)]
pub struct MoodOrchestrator {
    content: Arc<dyn ContentGenerationService>,
    kv: Arc<dyn KeyValueStore>,
    sessions: Arc<Mutex<HashMap<String, MoodSession>>>,
}

impl MoodOrchestrator {
    pub fn new(content: Arc<dyn ContentGenerationService>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            content,
            kv,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn history(&self, owner: &str) -> MoodHistoryStore {
        MoodHistoryStore::for_owner(self.kv.clone(), owner)
    }

    pub fn favorites(&self, owner: &str) -> FavoritesStore {
        FavoritesStore::for_owner(self.kv.clone(), owner)
    }

    pub async fn snapshot(&self, owner: &str) -> MoodSession {
        self.sessions
            .lock()
            .await
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    /// Selects a mood, journals it and requests content for it.
    pub async fn select_mood(
        &self,
        owner: &str,
        mood: MoodType,
    ) -> Result<SelectionOutcome, OrchestratorError> {
        self.begin(owner, Some(mood)).await?;
        info!(owner, mood = %mood, "Mood selected.");
        Ok(self.run_detached(owner, mood, true).await)
    }

    /// Requests a new package for the already selected mood without journaling.
    pub async fn refresh(&self, owner: &str) -> Result<SelectionOutcome, OrchestratorError> {
        let mood = self.begin(owner, None).await?;
        info!(owner, mood = %mood, "Refreshing content.");
        Ok(self.run_detached(owner, mood, false).await)
    }

    /// Clears the selection and returns to idle.
    pub async fn reset(&self, owner: &str) -> Result<MoodSession, OrchestratorError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(owner.to_string()).or_default();
        if session.state.is_requesting() {
            return Err(OrchestratorError::RequestInFlight);
        }
        *session = MoodSession::default();
        Ok(session.clone())
    }

    /// Moves the owner into `Requesting`. With `mood` set this is a new
    /// selection, otherwise the current selection is reused.
    async fn begin(&self, owner: &str, mood: Option<MoodType>) -> Result<MoodType, OrchestratorError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(owner.to_string()).or_default();
        if session.state.is_requesting() {
            warn!(owner, "Rejected a request while another is in flight.");
            return Err(OrchestratorError::RequestInFlight);
        }
        let mood = mood
            .or(session.selected_mood)
            .ok_or(OrchestratorError::NoMoodSelected)?;
        session.selected_mood = Some(mood);
        session.state = PipelineState::Requesting { mood };
        Ok(mood)
    }

    /// Runs the request on its own task so that a dropped caller cannot leave
    /// the owner stuck in `Requesting`.
    async fn run_detached(&self, owner: &str, mood: MoodType, journal: bool) -> SelectionOutcome {
        let this = self.clone();
        let task_owner = owner.to_string();
        let handle = tokio::spawn(async move { this.run(&task_owner, mood, journal).await });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(owner, error = %e, "Content task ended abnormally.");
                let session = self
                    .finish(owner, mood, Err(PortError::Unexpected(e.to_string())))
                    .await;
                SelectionOutcome {
                    session,
                    log: None,
                    warning: None,
                }
            }
        }
    }

    async fn run(&self, owner: &str, mood: MoodType, journal: bool) -> SelectionOutcome {
        let mut log = None;
        let mut warning = None;
        if journal {
            match self.history(owner).record(mood).await {
                Ok(entry) => log = Some(entry),
                Err(e) => {
                    warn!(owner, mood = %mood, error = %e, "Failed to journal mood.");
                    warning = Some(format!("Your mood could not be saved to history: {}", e));
                }
            }
        }

        let result = self.content.generate_healing_content(mood).await;
        let session = self.finish(owner, mood, result).await;
        SelectionOutcome {
            session,
            log,
            warning,
        }
    }

    async fn finish(
        &self,
        owner: &str,
        mood: MoodType,
        result: PortResult<HealingContent>,
    ) -> MoodSession {
        let state = match result {
            Ok(content) => {
                info!(owner, mood = %mood, "Content ready.");
                PipelineState::Succeeded {
                    mood,
                    content: Arc::new(content),
                }
            }
            Err(e) => {
                error!(owner, mood = %mood, error = %e, "Content request failed.");
                PipelineState::Failed {
                    mood,
                    retryable: e.is_retryable(),
                    message: e.to_string(),
                }
            }
        };

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(owner.to_string()).or_default();
        session.state = state;
        session.clone()
    }
}

/// A random loading message for the mood.
pub fn loading_message(mood: MoodType) -> &'static str {
    mood.loading_messages()
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_LOADING_MESSAGE)
}
