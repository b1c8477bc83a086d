//! services/api/src/web/protocol.rs
//!
//! Defines the JSON protocol between the browser client and the API server:
//! request payloads, response views, and the uniform error body.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use qalbu_core::domain::{MoodLog, MoodType, UserProfile};
use qalbu_core::ports::PortError;
use qalbu_core::stats::{MoodStats, RecentMoodWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::orchestrator::{MoodSession, OrchestratorError, PipelineState, SelectionOutcome};
use crate::records::{FavoriteBody, HealingContentRecord};
use crate::stores::StorageError;

//=========================================================================================
// Error Responses
//=========================================================================================

/// The body of every non-2xx JSON response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Whether repeating the same request may succeed.
    pub retryable: bool,
}

pub type HttpError = (StatusCode, Json<ErrorBody>);

pub fn reject(status: StatusCode, message: impl Into<String>, retryable: bool) -> HttpError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            retryable,
        }),
    )
}

pub fn status_for(error: &PortError) -> StatusCode {
    match error {
        PortError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        PortError::ContentGeneration(_)
        | PortError::SpeechGeneration(_)
        | PortError::Provider(_) => StatusCode::BAD_GATEWAY,
        PortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::Storage(_) | PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PortError> for ErrorBody {
    fn from(e: PortError) -> Self {
        Self {
            retryable: e.is_retryable(),
            error: e.to_string(),
        }
    }
}

pub fn port_rejection(e: PortError) -> HttpError {
    (status_for(&e), Json(ErrorBody::from(e)))
}

pub fn storage_rejection(e: StorageError) -> HttpError {
    reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), true)
}

pub fn orchestrator_rejection(e: OrchestratorError) -> HttpError {
    let status = match e {
        OrchestratorError::RequestInFlight => StatusCode::CONFLICT,
        OrchestratorError::NoMoodSelected => StatusCode::BAD_REQUEST,
    };
    reject(status, e.to_string(), false)
}

pub fn parse_mood(raw: &str) -> Result<MoodType, HttpError> {
    raw.parse::<MoodType>()
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string(), false))
}

//=========================================================================================
// Moods and Sessions
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MoodView {
    /// The display label, also the value stored in history.
    pub label: String,
    pub key: String,
    pub description: String,
    pub icon: String,
}

impl From<MoodType> for MoodView {
    fn from(mood: MoodType) -> Self {
        Self {
            label: mood.label().to_string(),
            key: mood.key().to_string(),
            description: mood.description().to_string(),
            icon: mood.icon().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadingMessageResponse {
    pub mood: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectMoodRequest {
    /// A mood label (`Sedih`) or key (`sad`).
    pub mood: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub status: SessionStatus,
    pub selected_mood: Option<MoodView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<HealingContentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl From<&MoodSession> for SessionView {
    fn from(session: &MoodSession) -> Self {
        let mut view = Self {
            status: SessionStatus::Idle,
            selected_mood: session.selected_mood.map(MoodView::from),
            content: None,
            error: None,
            retryable: None,
        };
        match &session.state {
            PipelineState::Idle => {}
            PipelineState::Requesting { .. } => view.status = SessionStatus::Requesting,
            PipelineState::Succeeded { content, .. } => {
                view.status = SessionStatus::Succeeded;
                view.content = Some(HealingContentRecord::from(content.as_ref()));
            }
            PipelineState::Failed {
                message, retryable, ..
            } => {
                view.status = SessionStatus::Failed;
                view.error = Some(message.clone());
                view.retryable = Some(*retryable);
            }
        }
        view
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectMoodResponse {
    pub session: SessionView,
    /// The history entry created for this selection.
    pub log_id: Option<Uuid>,
    pub warning: Option<String>,
}

impl SelectMoodResponse {
    /// Succeeded outcomes become a response; failed ones become an error
    /// whose status reflects whether retrying can help.
    pub fn from_outcome(outcome: SelectionOutcome) -> Result<Self, HttpError> {
        if let PipelineState::Failed {
            message, retryable, ..
        } = &outcome.session.state
        {
            let status = if *retryable {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            return Err(reject(status, message.clone(), *retryable));
        }
        Ok(Self {
            session: SessionView::from(&outcome.session),
            log_id: outcome.log.map(|log| log.id),
            warning: outcome.warning,
        })
    }
}

//=========================================================================================
// Speech
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct SpeechRequest {
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SpeechResponse {
    /// Base64-encoded 16-bit little-endian PCM.
    pub audio_base64: String,
    pub sample_rate: u32,
    pub channels: u16,
}

//=========================================================================================
// History
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MoodLogView {
    pub id: Uuid,
    pub mood: MoodView,
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl From<&MoodLog> for MoodLogView {
    fn from(log: &MoodLog) -> Self {
        Self {
            id: log.id,
            mood: MoodView::from(log.mood),
            created_at: log.created_at,
            note: log.note.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NoteRequest {
    pub note: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoodCountView {
    pub mood: MoodView,
    pub count: usize,
}

fn count_views(counts: &BTreeMap<MoodType, usize>) -> Vec<MoodCountView> {
    counts
        .iter()
        .map(|(mood, count)| MoodCountView {
            mood: MoodView::from(*mood),
            count: *count,
        })
        .collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentWindowView {
    pub days: i64,
    pub counts: Vec<MoodCountView>,
    pub max_count: usize,
    pub total: usize,
}

impl From<&RecentMoodWindow> for RecentWindowView {
    fn from(window: &RecentMoodWindow) -> Self {
        Self {
            days: qalbu_core::stats::RECENT_WINDOW_DAYS,
            counts: count_views(&window.counts),
            max_count: window.max_count,
            total: window.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoodStatsView {
    pub total: usize,
    pub counts: Vec<MoodCountView>,
    pub dominant: Option<MoodView>,
    pub recent: RecentWindowView,
}

impl From<&MoodStats> for MoodStatsView {
    fn from(stats: &MoodStats) -> Self {
        Self {
            total: stats.total,
            counts: count_views(&stats.counts),
            dominant: stats.dominant.map(MoodView::from),
            recent: RecentWindowView::from(&stats.recent),
        }
    }
}

//=========================================================================================
// Favorites
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveFavoriteRequest {
    #[serde(flatten)]
    pub body: FavoriteBody,
    /// The mood label the item was shown for.
    pub mood_context: String,
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileView {
    pub uid: Uuid,
    pub email: String,
    pub display_name: String,
    pub photo_url: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

impl From<&UserProfile> for ProfileView {
    fn from(p: &UserProfile) -> Self {
        Self {
            uid: p.uid,
            email: p.email.clone(),
            display_name: p.display_name.clone(),
            photo_url: p.photo_url.clone(),
            status: p.status.as_str().to_string(),
            requested_at: p.requested_at,
        }
    }
}
