//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and the current profile.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use qalbu_core::ports::{AccountService, PortError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{session_cookie, SESSION_COOKIE};
use crate::web::protocol::{port_rejection, reject, ErrorBody, HttpError, ProfileView};
use crate::web::state::{AppState, Principal};

pub const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), HttpError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(reject(StatusCode::BAD_REQUEST, "A valid email is required.", false));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(reject(
                StatusCode::BAD_REQUEST,
                format!("Password must be at least {} characters.", MIN_PASSWORD_LEN),
                false,
            ));
        }
        if self.display_name.trim().is_empty() {
            return Err(reject(StatusCode::BAD_REQUEST, "A display name is required.", false));
        }
        Ok(())
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn accounts(state: &AppState) -> Result<&Arc<dyn AccountService>, HttpError> {
    state.accounts.as_ref().ok_or_else(|| {
        reject(
            StatusCode::SERVICE_UNAVAILABLE,
            "Accounts are disabled: the service is running in demo mode.",
            false,
        )
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an auth session and the cookie that carries it.
async fn open_session(
    state: &AppState,
    accounts: &Arc<dyn AccountService>,
    user_id: Uuid,
) -> Result<String, HttpError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let lifetime = Duration::days(state.config.auth_session_days);
    let expires_at = Utc::now() + lifetime;

    accounts
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            port_rejection(e)
        })?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        lifetime.num_seconds()
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account awaiting approval
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created; status is pending", body = ProfileView),
        (status = 400, description = "Invalid request or email already registered", body = ErrorBody),
        (status = 503, description = "Demo mode", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let accounts = accounts(&state)?;
    req.validate()?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password.", true)
        })?
        .to_string();

    // 2. Create the account
    let profile = accounts
        .create_account(
            &normalize_email(&req.email),
            &password_hash,
            req.display_name.trim(),
        )
        .await
        .map_err(|e| {
            error!("Failed to create account: {:?}", e);
            port_rejection(e)
        })?;
    info!(user_id = %profile.uid, "Account created; awaiting approval.");

    // 3. Sign the new user in so the client can show the pending screen
    let cookie = open_session(&state, accounts, profile.uid).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(ProfileView::from(&profile)),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ProfileView),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 503, description = "Demo mode", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let accounts = accounts(&state)?;
    let invalid = || reject(StatusCode::UNAUTHORIZED, "Invalid email or password.", false);

    // 1. Get credentials by email
    let creds = accounts
        .get_credentials_by_email(&normalize_email(&req.email))
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid(),
            other => {
                error!("Failed to get credentials: {:?}", other);
                port_rejection(other)
            }
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error.", false)
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    // 3. Open a session; status gating happens on protected routes
    let profile = accounts.get_profile(creds.user_id).await.map_err(port_rejection)?;
    let cookie = open_session(&state, accounts, creds.user_id).await?;
    info!(user_id = %creds.user_id, status = profile.status.as_str(), "User logged in.");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ProfileView::from(&profile)),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorBody),
        (status = 503, description = "Demo mode", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let accounts = accounts(&state)?;
    let auth_session_id = session_cookie(&headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "No session found.", false))?;

    accounts
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            port_rejection(e)
        })?;

    let cookie = format!("{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /me - The signed-in user's profile
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current profile", body = ProfileView),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 403, description = "Pending or blocked", body = ErrorBody),
        (status = 503, description = "Demo mode", body = ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ProfileView>, HttpError> {
    let accounts = accounts(&state)?;
    let user_id = principal
        .user_id
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not signed in.", false))?;
    let profile = accounts.get_profile(user_id).await.map_err(port_rejection)?;
    Ok(Json(ProfileView::from(&profile)))
}
