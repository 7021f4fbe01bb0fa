//! Handshake credential decoding.
//!
//! The token service (an external collaborator) issues HS256 JWTs at login
//! with the user id in `sub` and the role name in `role`. The WebSocket
//! endpoint decodes them here before a connection is allowed into the
//! registry.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use medpulse_core::{Role, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by the handshake credential.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string (issuer convention).
    pub sub: String,
    /// Role name assigned at login.
    pub role: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: usize,
}

/// Authenticated identity extracted from a handshake token.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Owning user.
    pub user_id: UserId,
    /// Raw role name from the token, kept for logging and the welcome event.
    pub role_name: String,
    /// Parsed role; `None` when the name is not a recognized fanout role.
    pub role: Option<Role>,
}

/// Handshake failures. Reported to the client via a close frame, never as an
/// application error.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `token` query parameter was supplied.
    #[error("token not provided")]
    MissingToken,
    /// The token failed signature or expiry validation.
    #[error("invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    /// The `sub` claim is not an integer user id.
    #[error("token subject is not a user id")]
    MalformedSubject,
}

/// Decode and validate a handshake token.
pub fn decode_token(secret: &str, token: &str) -> Result<Identity, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(AuthError::InvalidToken)?;

    let user_id = data
        .claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AuthError::MalformedSubject)?;
    let role = Role::parse(&data.claims.role);

    Ok(Identity {
        user_id,
        role_name: data.claims.role,
        role,
    })
}

/// Issue a handshake token valid for `ttl_secs`.
///
/// The real issuer lives in the login service; this mirrors its claim layout
/// for operational tooling and tests.
pub fn issue_token(
    secret: &str,
    user_id: UserId,
    role: &str,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = jsonwebtoken::get_current_timestamp() + ttl_secs;
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: exp as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
