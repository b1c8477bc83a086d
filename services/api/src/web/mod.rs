pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
use auth::{login_handler, logout_handler, me_handler, signup_handler};
use rest::*;
use state::AppState;

/// Builds the API router: public routes, and protected routes behind `require_auth`.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/moods", get(list_moods_handler))
        .route("/moods/{mood}/loading-message", get(loading_message_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(me_handler))
        .route("/session", get(get_session_handler))
        .route("/session/mood", post(select_mood_handler))
        .route("/session/refresh", post(refresh_handler))
        .route("/session/reset", post(reset_handler))
        .route("/speech", post(speech_handler))
        .route("/speech/wav", post(speech_wav_handler))
        .route("/history", get(list_history_handler).delete(clear_history_handler))
        .route("/history/stats", get(history_stats_handler))
        .route("/history/{id}/note", put(update_note_handler))
        .route("/favorites", get(list_favorites_handler).post(save_favorite_handler))
        .route(
            "/favorites/{id}",
            get(get_favorite_handler).delete(delete_favorite_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
