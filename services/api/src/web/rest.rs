//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI document.

use crate::adapters::speech::{decode_pcm, pcm16_to_wav};
use crate::orchestrator::loading_message;
use crate::records::{FavoriteBody, FavoriteRecord, HadithRecord, HealingContentRecord, QuranRecord};
use crate::web::auth::{LoginRequest, SignupRequest};
use crate::web::protocol::{
    orchestrator_rejection, parse_mood, port_rejection, reject, storage_rejection, ErrorBody,
    HttpError, LoadingMessageResponse, MoodCountView, MoodLogView, MoodStatsView, MoodView,
    NoteRequest, ProfileView, RecentWindowView, SaveFavoriteRequest, SelectMoodRequest,
    SelectMoodResponse, SessionStatus, SessionView, SpeechRequest, SpeechResponse,
};
use crate::web::state::{AppState, Principal};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use qalbu_core::domain::{FavoriteContent, FavoriteItem, MoodType};
use qalbu_core::stats::MoodStats;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        list_moods_handler,
        loading_message_handler,
        get_session_handler,
        select_mood_handler,
        refresh_handler,
        reset_handler,
        speech_handler,
        speech_wav_handler,
        list_history_handler,
        clear_history_handler,
        update_note_handler,
        history_stats_handler,
        list_favorites_handler,
        save_favorite_handler,
        get_favorite_handler,
        delete_favorite_handler,
    ),
    components(
        schemas(
            ErrorBody, MoodView, LoadingMessageResponse, SelectMoodRequest, SelectMoodResponse,
            SessionStatus, SessionView, HealingContentRecord, QuranRecord, HadithRecord,
            SpeechRequest, SpeechResponse, MoodLogView, NoteRequest, MoodCountView,
            RecentWindowView, MoodStatsView, SaveFavoriteRequest, FavoriteBody, FavoriteRecord,
            ProfileView, SignupRequest, LoginRequest
        )
    ),
    tags(
        (name = "Qalbu API", description = "Mood-based spiritual guidance: generated content, journaling and favorites.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Moods
//=========================================================================================

/// List the selectable moods.
#[utoipa::path(
    get,
    path = "/moods",
    responses((status = 200, description = "All twelve moods", body = [MoodView]))
)]
pub async fn list_moods_handler() -> Json<Vec<MoodView>> {
    Json(MoodType::ALL.into_iter().map(MoodView::from).collect())
}

/// A random message to show while content for the mood is being prepared.
#[utoipa::path(
    get,
    path = "/moods/{mood}/loading-message",
    params(("mood" = String, Path, description = "Mood label or key")),
    responses(
        (status = 200, description = "A loading message", body = LoadingMessageResponse),
        (status = 400, description = "Unknown mood", body = ErrorBody)
    )
)]
pub async fn loading_message_handler(
    Path(mood): Path<String>,
) -> Result<Json<LoadingMessageResponse>, HttpError> {
    let mood = parse_mood(&mood)?;
    Ok(Json(LoadingMessageResponse {
        mood: mood.label().to_string(),
        message: loading_message(mood).to_string(),
    }))
}

//=========================================================================================
// Session
//=========================================================================================

/// The caller's current selection and pipeline state.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Json<SessionView> {
    let session = state.orchestrator.snapshot(&principal.owner).await;
    Json(SessionView::from(&session))
}

/// Select a mood: journal it and generate content for it.
#[utoipa::path(
    post,
    path = "/session/mood",
    request_body = SelectMoodRequest,
    responses(
        (status = 200, description = "Content generated", body = SelectMoodResponse),
        (status = 400, description = "Unknown mood", body = ErrorBody),
        (status = 409, description = "A request is already in flight", body = ErrorBody),
        (status = 502, description = "The provider failed; retry may help", body = ErrorBody),
        (status = 503, description = "No provider credential configured", body = ErrorBody)
    )
)]
pub async fn select_mood_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SelectMoodRequest>,
) -> Result<Json<SelectMoodResponse>, HttpError> {
    let mood = parse_mood(&req.mood)?;
    let outcome = state
        .orchestrator
        .select_mood(&principal.owner, mood)
        .await
        .map_err(orchestrator_rejection)?;
    SelectMoodResponse::from_outcome(outcome).map(Json)
}

/// Generate a new package for the selected mood without journaling it again.
#[utoipa::path(
    post,
    path = "/session/refresh",
    responses(
        (status = 200, description = "Content generated", body = SelectMoodResponse),
        (status = 400, description = "No mood selected", body = ErrorBody),
        (status = 409, description = "A request is already in flight", body = ErrorBody),
        (status = 502, description = "The provider failed; retry may help", body = ErrorBody),
        (status = 503, description = "No provider credential configured", body = ErrorBody)
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SelectMoodResponse>, HttpError> {
    let outcome = state
        .orchestrator
        .refresh(&principal.owner)
        .await
        .map_err(orchestrator_rejection)?;
    SelectMoodResponse::from_outcome(outcome).map(Json)
}

/// Return to mood selection.
#[utoipa::path(
    post,
    path = "/session/reset",
    responses(
        (status = 200, description = "Session is idle", body = SessionView),
        (status = 409, description = "A request is already in flight", body = ErrorBody)
    )
)]
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SessionView>, HttpError> {
    let session = state
        .orchestrator
        .reset(&principal.owner)
        .await
        .map_err(orchestrator_rejection)?;
    Ok(Json(SessionView::from(&session)))
}

//=========================================================================================
// Speech
//=========================================================================================

/// Render text to base64 PCM (16-bit, 24 kHz, mono).
#[utoipa::path(
    post,
    path = "/speech",
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "Rendered audio", body = SpeechResponse),
        (status = 400, description = "Empty text", body = ErrorBody),
        (status = 502, description = "The provider failed", body = ErrorBody),
        (status = 503, description = "No provider credential configured", body = ErrorBody)
    )
)]
pub async fn speech_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SpeechResponse>, HttpError> {
    let audio = state
        .speech
        .generate_speech(&req.text)
        .await
        .map_err(port_rejection)?;
    Ok(Json(SpeechResponse {
        audio_base64: audio.pcm_base64,
        sample_rate: audio.sample_rate,
        channels: audio.channels,
    }))
}

/// Render text to a WAV file.
#[utoipa::path(
    post,
    path = "/speech/wav",
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "WAV audio", body = Vec<u8>, content_type = "audio/wav"),
        (status = 400, description = "Empty text", body = ErrorBody),
        (status = 502, description = "The provider failed", body = ErrorBody),
        (status = 503, description = "No provider credential configured", body = ErrorBody)
    )
)]
pub async fn speech_wav_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeechRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let audio = state
        .speech
        .generate_speech(&req.text)
        .await
        .map_err(port_rejection)?;
    let pcm = decode_pcm(&audio).map_err(port_rejection)?;
    let wav = pcm16_to_wav(&pcm, audio.sample_rate, audio.channels).map_err(|e| {
        error!("Failed to encode WAV: {:?}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode audio.", true)
    })?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav))
}

//=========================================================================================
// History
//=========================================================================================

/// The caller's mood history, newest first.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Mood history", body = [MoodLogView]),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn list_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<MoodLogView>>, HttpError> {
    let logs = state
        .orchestrator
        .history(&principal.owner)
        .all()
        .await
        .map_err(storage_rejection)?;
    Ok(Json(logs.iter().map(MoodLogView::from).collect()))
}

/// Delete the caller's entire mood history.
#[utoipa::path(
    delete,
    path = "/history",
    responses(
        (status = 204, description = "History cleared"),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn clear_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, HttpError> {
    state
        .orchestrator
        .history(&principal.owner)
        .clear()
        .await
        .map_err(storage_rejection)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a journal note to a history entry. A blank note clears it.
#[utoipa::path(
    put,
    path = "/history/{id}/note",
    params(("id" = Uuid, Path, description = "Mood log id")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Updated entry", body = MoodLogView),
        (status = 404, description = "No readable entry with that id", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<MoodLogView>, HttpError> {
    let updated = state
        .orchestrator
        .history(&principal.owner)
        .attach_note(id, &req.note)
        .await
        .map_err(storage_rejection)?
        .ok_or_else(|| {
            reject(StatusCode::NOT_FOUND, format!("Mood log {} not found.", id), false)
        })?;
    Ok(Json(MoodLogView::from(&updated)))
}

/// All-time and 30-day mood statistics.
#[utoipa::path(
    get,
    path = "/history/stats",
    responses(
        (status = 200, description = "Mood statistics", body = MoodStatsView),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn history_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MoodStatsView>, HttpError> {
    let logs = state
        .orchestrator
        .history(&principal.owner)
        .all()
        .await
        .map_err(storage_rejection)?;
    let stats = MoodStats::from_logs(&logs, Utc::now());
    Ok(Json(MoodStatsView::from(&stats)))
}

//=========================================================================================
// Favorites
//=========================================================================================

/// The caller's favorites, newest first.
#[utoipa::path(
    get,
    path = "/favorites",
    responses(
        (status = 200, description = "Favorites", body = [FavoriteRecord]),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn list_favorites_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<FavoriteRecord>>, HttpError> {
    let items = state
        .orchestrator
        .favorites(&principal.owner)
        .all()
        .await
        .map_err(storage_rejection)?;
    Ok(Json(items.iter().map(FavoriteRecord::from).collect()))
}

/// Save a verse or hadith. Saving an item twice keeps the first copy.
#[utoipa::path(
    post,
    path = "/favorites",
    request_body = SaveFavoriteRequest,
    responses(
        (status = 201, description = "Saved", body = FavoriteRecord),
        (status = 200, description = "Already saved", body = FavoriteRecord),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn save_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SaveFavoriteRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let content = match req.body {
        FavoriteBody::Quran(q) => FavoriteContent::Quran(q.to_domain()),
        FavoriteBody::Hadith(h) => FavoriteContent::Hadith(h.to_domain()),
    };
    let item = FavoriteItem::new(content, req.mood_context);
    let favorites = state.orchestrator.favorites(&principal.owner);

    if favorites.save(&item).await.map_err(storage_rejection)? {
        return Ok((StatusCode::CREATED, Json(FavoriteRecord::from(&item))));
    }
    let id = item.id.clone();
    info!(favorite_id = %id, "Favorite already saved.");
    let existing = favorites
        .get(&id)
        .await
        .map_err(storage_rejection)?
        .unwrap_or(item);
    Ok((StatusCode::OK, Json(FavoriteRecord::from(&existing))))
}

/// Look up one favorite, e.g. to show whether an item is saved.
#[utoipa::path(
    get,
    path = "/favorites/{id}",
    params(("id" = String, Path, description = "Favorite id, e.g. quran-2-286")),
    responses(
        (status = 200, description = "The favorite", body = FavoriteRecord),
        (status = 404, description = "Not saved", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn get_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteRecord>, HttpError> {
    let item = state
        .orchestrator
        .favorites(&principal.owner)
        .get(&id)
        .await
        .map_err(storage_rejection)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("Favorite {} not found.", id), false))?;
    Ok(Json(FavoriteRecord::from(&item)))
}

/// Remove a favorite. Removing an unknown id succeeds.
#[utoipa::path(
    delete,
    path = "/favorites/{id}",
    params(("id" = String, Path, description = "Favorite id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn delete_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state
        .orchestrator
        .favorites(&principal.owner)
        .remove(&id)
        .await
        .map_err(storage_rejection)?;
    Ok(StatusCode::NO_CONTENT)
}
