//! Opaque session tokens and the signed two-factor ticket.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Errors returned by [`validate_two_factor_ticket`].
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("ticket expired")]
    Expired,
    #[error("malformed ticket")]
    Malformed,
    #[error("failed to sign ticket")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Generate a fresh session token: 32 random bytes, base64url without padding.
///
/// The raw value only ever travels in the cookie; persist [`hash_token`] of it.
pub fn generate_session_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a bearer secret, base64url encoded. Used as the lookup key for
/// session tokens, password-reset tokens and backup codes.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Claims of the two-factor ticket.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user id (UUID string) |
/// | `exp` | `exp` | seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct TwoFactorClaims {
    pub sub: String,
    pub exp: u64,
}

/// Sign a two-factor ticket for `user_id` that expires at `exp` (unix seconds).
pub fn issue_two_factor_ticket(user_id: Uuid, exp: u64, secret: &str) -> Result<String, TicketError> {
    let claims = TwoFactorClaims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TicketError::Encode)
}

/// Validate a two-factor ticket and return the user id it was issued for.
///
/// HS256, `exp` and `sub` required. No leeway: the ticket is short-lived and
/// only this service issues it.
pub fn validate_two_factor_ticket(ticket: &str, secret: &str) -> Result<Uuid, TicketError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<TwoFactorClaims>(
        ticket,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TicketError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TicketError::InvalidSignature,
        _ => TicketError::Malformed,
    })?;

    data.claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| TicketError::Malformed)
}
