//! Handlers for the `/auth` resource (login, session, logout).

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use leadboard_core::error::CoreError;
use leadboard_core::session::{SessionInfo, SessionMarker, SessionState};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::issue_token;
use crate::auth::password::verify_password;
use crate::auth::users::find_user;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, CurrentSession};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Session lifetime in seconds.
    pub expires_in: i64,
    pub session: SessionInfo,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

/// POST /api/v1/auth/login
///
/// Check the credentials against the configured accounts and hand back a
/// signed session marker bound to the caller's user agent.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let user = find_user(&state.config.users, &input.username).ok_or_else(|| {
        tracing::info!(username = %input.username, "Login for unknown user");
        invalid_credentials()
    })?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(username = %user.username, "Login with wrong password");
        return Err(invalid_credentials());
    }

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let ttl = state.config.jwt.session_ttl();
    let marker = SessionMarker::issue(&user.username, &user.role, user_agent, Utc::now(), ttl);
    let (token, jti) = issue_token(&marker, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token signing error: {e}")))?;

    let session = match SessionState::Checking.resolve(Ok(Some(marker)), user_agent, Utc::now()) {
        SessionState::Authenticated { session } => session,
        other => {
            return Err(AppError::InternalError(format!(
                "fresh session did not resolve: {other:?}"
            )))
        }
    };

    tracing::info!(username = %session.username, role = %session.role, jti = %jti, "User logged in");

    Ok(Json(DataResponse {
        data: LoginResponse {
            token,
            expires_in: ttl.num_seconds(),
            session,
        },
    }))
}

/// GET /api/v1/auth/session
///
/// Report the resolved session state. Never rejects: an unauthenticated
/// caller gets `{"state":"unauthenticated","reason":..}`.
pub async fn session(CurrentSession(state): CurrentSession) -> Json<DataResponse<SessionState>> {
    Json(DataResponse { data: state })
}

/// POST /api/v1/auth/logout
///
/// Tokens are not stored server-side; the client discards its marker.
pub async fn logout(user: AuthUser) -> StatusCode {
    tracing::info!(username = %user.username, "User logged out");
    StatusCode::NO_CONTENT
}
