//! Session resolution for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use chrono::Utc;
use leadboard_core::error::CoreError;
use leadboard_core::session::{SessionMarker, SessionState, UnauthenticatedReason, ADMIN_ROLE};

use crate::auth::jwt::decode_claims;
use crate::error::AppError;
use crate::state::AppState;

/// The request's session, resolved once from the `Authorization` header and
/// the client's user agent.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionState);

/// Read the user agent a request was sent with.
pub fn user_agent(parts: &Parts) -> Option<&str> {
    parts.headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// `Ok(None)` when no bearer token was sent, `Err(())` when one was sent
/// but did not verify.
fn read_marker(parts: &Parts, state: &AppState) -> Result<Option<SessionMarker>, ()> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(())?;
    decode_claims(token.trim(), &state.config.jwt)
        .map(|claims| Some(claims.marker))
        .map_err(|_| ())
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let marker = read_marker(parts, state);
        let resolved = SessionState::Checking.resolve(marker, user_agent(parts), Utc::now());
        Ok(CurrentSession(resolved))
    }
}

/// Authenticated caller.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(username = %user.username, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(resolved) = CurrentSession::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        match resolved {
            SessionState::Authenticated { session } => Ok(AuthUser {
                username: session.username,
                role: session.role,
            }),
            SessionState::Unauthenticated { reason } => {
                Err(AppError::Core(CoreError::Unauthorized(rejection_message(reason).into())))
            }
            SessionState::Checking => Err(AppError::InternalError(
                "session left unresolved".into(),
            )),
        }
    }
}

fn rejection_message(reason: UnauthenticatedReason) -> &'static str {
    match reason {
        UnauthenticatedReason::Missing => "Missing Authorization header",
        UnauthenticatedReason::Invalid => "Invalid session token",
        UnauthenticatedReason::Expired => "Session expired, please sign in again",
        UnauthenticatedReason::FingerprintMismatch => "Session belongs to another browser",
    }
}
