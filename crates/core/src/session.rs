//! Login session state.
//!
//! A request starts out `Checking` and is resolved exactly once into
//! `Authenticated` or `Unauthenticated`. The marker travels inside a signed
//! token; this module only decides whether a decoded marker is still good.

use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Timestamp;

/// Default session lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// SHA-256 hex of the client's user agent. A missing agent hashes the
/// empty string.
pub fn fingerprint_agent(user_agent: Option<&str>) -> String {
    format!("{:x}", Sha256::digest(user_agent.unwrap_or_default().as_bytes()))
}

/// What the client holds between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarker {
    #[serde(rename = "sub")]
    pub username: String,
    pub role: String,
    /// Unix seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "fgp")]
    pub fingerprint: String,
}

impl SessionMarker {
    pub fn issue(
        username: &str,
        role: &str,
        user_agent: Option<&str>,
        now: Timestamp,
        ttl: Duration,
    ) -> Self {
        Self {
            username: username.to_string(),
            role: role.to_string(),
            issued_at: now.timestamp(),
            expires_at: (now + ttl).timestamp(),
            fingerprint: fingerprint_agent(user_agent),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.timestamp() >= self.expires_at
    }
}

/// The only role allowed to change settings or see raw phone numbers.
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated identity exposed to handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub username: String,
    pub role: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl SessionInfo {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnauthenticatedReason {
    Missing,
    Invalid,
    Expired,
    FingerprintMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Checking,
    Authenticated { session: SessionInfo },
    Unauthenticated { reason: UnauthenticatedReason },
}

impl SessionState {
    /// Resolve a `Checking` state. Already-resolved states are returned
    /// unchanged.
    ///
    /// `marker` is `Err(())` when a token was presented but could not be
    /// decoded, `Ok(None)` when nothing was presented.
    pub fn resolve(
        self,
        marker: Result<Option<SessionMarker>, ()>,
        user_agent: Option<&str>,
        now: Timestamp,
    ) -> SessionState {
        if !matches!(self, SessionState::Checking) {
            return self;
        }
        let marker = match marker {
            Err(()) => return Self::unauthenticated(UnauthenticatedReason::Invalid),
            Ok(None) => return Self::unauthenticated(UnauthenticatedReason::Missing),
            Ok(Some(m)) => m,
        };
        if marker.is_expired(now) {
            return Self::unauthenticated(UnauthenticatedReason::Expired);
        }
        if marker.fingerprint != fingerprint_agent(user_agent) {
            return Self::unauthenticated(UnauthenticatedReason::FingerprintMismatch);
        }
        match (
            Utc.timestamp_opt(marker.issued_at, 0).single(),
            Utc.timestamp_opt(marker.expires_at, 0).single(),
        ) {
            (Some(issued_at), Some(expires_at)) => SessionState::Authenticated {
                session: SessionInfo {
                    username: marker.username,
                    role: marker.role,
                    issued_at,
                    expires_at,
                },
            },
            _ => Self::unauthenticated(UnauthenticatedReason::Invalid),
        }
    }

    fn unauthenticated(reason: UnauthenticatedReason) -> Self {
        SessionState::Unauthenticated { reason }
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        match self {
            SessionState::Authenticated { session } => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64)";

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn marker() -> SessionMarker {
        SessionMarker::issue("ana", "admin", Some(UA), now(), Duration::hours(DEFAULT_TTL_HOURS))
    }

    #[test]
    fn valid_marker_authenticates() {
        let state = SessionState::Checking.resolve(Ok(Some(marker())), Some(UA), now());
        let session = state.session().expect("should be authenticated");
        assert_eq!(session.username, "ana");
        assert!(session.is_admin());
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(24));
    }

    #[test]
    fn expires_after_ttl() {
        let later = now() + Duration::hours(24);
        let state = SessionState::Checking.resolve(Ok(Some(marker())), Some(UA), later);
        assert_matches!(
            state,
            SessionState::Unauthenticated { reason: UnauthenticatedReason::Expired }
        );
    }

    #[test]
    fn different_agent_is_rejected() {
        let state = SessionState::Checking.resolve(Ok(Some(marker())), Some("curl/8.0"), now());
        assert_matches!(
            state,
            SessionState::Unauthenticated { reason: UnauthenticatedReason::FingerprintMismatch }
        );
    }

    #[test]
    fn missing_and_invalid_markers() {
        assert_matches!(
            SessionState::Checking.resolve(Ok(None), Some(UA), now()),
            SessionState::Unauthenticated { reason: UnauthenticatedReason::Missing }
        );
        assert_matches!(
            SessionState::Checking.resolve(Err(()), Some(UA), now()),
            SessionState::Unauthenticated { reason: UnauthenticatedReason::Invalid }
        );
    }

    #[test]
    fn resolves_only_once() {
        let resolved = SessionState::Checking.resolve(Ok(None), Some(UA), now());
        let again = resolved.clone().resolve(Ok(Some(marker())), Some(UA), now());
        assert_eq!(resolved, again);
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        let fp = fingerprint_agent(None);
        assert_eq!(fp, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_ne!(fingerprint_agent(Some(UA)), fp);
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(SessionState::Unauthenticated {
            reason: UnauthenticatedReason::Expired,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "state": "unauthenticated", "reason": "expired" }));
    }
}
