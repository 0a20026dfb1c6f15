//! Session markers carried as HS256 tokens.
//!
//! The token only proves the marker was issued by this server. Whether the
//! marker is still good (expiry, user-agent fingerprint) is decided by
//! [`SessionState::resolve`](leadboard_core::session::SessionState::resolve),
//! so expiry validation is switched off at the token layer.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use leadboard_core::session::{SessionMarker, DEFAULT_TTL_HOURS};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub marker: SessionMarker,
    /// Unique token identifier, logged on sign-in and sign-out.
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Session lifetime in hours (default: 24).
    pub session_ttl_hours: i64,
}

impl JwtConfig {
    /// Load from `JWT_SECRET` (required) and `SESSION_TTL_HOURS`.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let session_ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_TTL_HOURS.to_string())
            .parse()
            .expect("SESSION_TTL_HOURS must be a valid i64");
        assert!(session_ttl_hours > 0, "SESSION_TTL_HOURS must be positive");

        Self {
            secret,
            session_ttl_hours,
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

/// Sign a marker. Returns the token and its `jti`.
pub fn issue_token(
    marker: &SessionMarker,
    config: &JwtConfig,
) -> Result<(String, String), jsonwebtoken::errors::Error> {
    let claims = SessionClaims {
        marker: marker.clone(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok((token, claims.jti))
}

/// Check the signature and read the claims back. Expired markers decode
/// fine; the session gate rejects them.
pub fn decode_claims(
    token: &str,
    config: &JwtConfig,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
