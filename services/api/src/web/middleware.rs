//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use qalbu_core::domain::{UserProfile, UserStatus};
use qalbu_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::protocol::{port_rejection, reject, HttpError};
use crate::web::state::{AppState, Principal};

pub const SESSION_COOKIE: &str = "session";

/// Reads the auth session id from the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Turns a profile into a principal, or the reason access is denied.
pub fn admit(profile: &UserProfile) -> Result<Principal, HttpError> {
    match profile.status {
        UserStatus::Approved => Ok(Principal::user(profile.uid)),
        UserStatus::Pending => Err(reject(
            StatusCode::FORBIDDEN,
            "Your account is awaiting approval.",
            false,
        )),
        UserStatus::Blocked => Err(reject(
            StatusCode::FORBIDDEN,
            "Your account has been blocked.",
            false,
        )),
    }
}

/// Middleware that validates the auth session cookie and gates on the profile status.
///
/// Approved users get a `Principal` in the request extensions. Without an
/// account service every caller shares the demo principal.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let Some(accounts) = state.accounts.as_ref() else {
        req.extensions_mut().insert(Principal::demo());
        return Ok(next.run(req).await);
    };

    // 1. Parse session ID from cookie
    let auth_session_id = session_cookie(req.headers())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not signed in.", false))?;

    // 2. Validate auth session, get user_id
    let user_id = accounts
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                reject(StatusCode::UNAUTHORIZED, "Session expired or invalid.", false)
            }
            other => {
                error!("Failed to validate auth session: {:?}", other);
                port_rejection(other)
            }
        })?;

    // 3. Gate on the profile status
    let profile = accounts.get_profile(user_id).await.map_err(|e| {
        error!(%user_id, "Failed to load profile: {:?}", e);
        port_rejection(e)
    })?;
    let principal = admit(&profile).inspect_err(|_| {
        warn!(%user_id, status = profile.status.as_str(), "Denied access to a protected route.");
    })?;

    // 4. Insert the principal into request extensions
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
