use chrono::{Duration, SecondsFormat, Utc};
use uuid::Uuid;

use tracker_auth_types::token::{generate_session_token, hash_token};
use tracker_domain::validate::{normalize_email, validate_password};

use crate::crypto::hash_password;
use crate::domain::repository::{SessionRepository, UserRepository, VerificationRepository};
use crate::domain::types::{
    OutboxEvent, PASSWORD_RESET_REQUESTED, RESET_TOKEN_TTL_SECS, Verification,
};
use crate::error::TrackerError;

// ── Forget password ───────────────────────────────────────────────────────────

pub struct ForgetPasswordUseCase<U, V>
where
    U: UserRepository,
    V: VerificationRepository,
{
    pub users: U,
    pub verifications: V,
}

impl<U, V> ForgetPasswordUseCase<U, V>
where
    U: UserRepository,
    V: VerificationRepository,
{
    /// Succeeds whether or not the address is registered.
    pub async fn execute(&self, raw_email: &str) -> Result<(), TrackerError> {
        let email = normalize_email(raw_email)?;
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(());
        };

        let token = generate_session_token();
        let now = Utc::now();
        let verification = Verification {
            id: Uuid::now_v7(),
            identifier: Verification::reset_password_identifier(user.id),
            value_hash: hash_token(&token),
            expires_at: now + Duration::seconds(RESET_TOKEN_TTL_SECS),
            created_at: now,
        };
        let event = OutboxEvent {
            id: Uuid::now_v7(),
            kind: PASSWORD_RESET_REQUESTED.to_owned(),
            payload: serde_json::json!({
                "userId": user.id,
                "email": user.email,
                "token": token,
                "expiresAt": verification
                    .expires_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            idempotency_key: format!("password-reset:{}", verification.id),
        };
        self.verifications
            .create_with_outbox(&verification, &event)
            .await?;

        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(())
    }
}

// ── Reset password ────────────────────────────────────────────────────────────

pub struct ResetPasswordUseCase<U, V, S>
where
    U: UserRepository,
    V: VerificationRepository,
    S: SessionRepository,
{
    pub users: U,
    pub verifications: V,
    pub sessions: S,
}

impl<U, V, S> ResetPasswordUseCase<U, V, S>
where
    U: UserRepository,
    V: VerificationRepository,
    S: SessionRepository,
{
    /// Consumes the token and signs the user out everywhere.
    pub async fn execute(&self, token: &str, new_password: &str) -> Result<(), TrackerError> {
        validate_password(new_password)?;

        let verification = self
            .verifications
            .take_by_hash(&hash_token(token.trim()))
            .await?
            .ok_or(TrackerError::InvalidToken)?;
        if verification.expires_at <= Utc::now() {
            return Err(TrackerError::InvalidToken);
        }
        let user_id = verification
            .reset_password_user()
            .ok_or(TrackerError::InvalidToken)?;
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(TrackerError::InvalidToken);
        }

        let hash = hash_password(new_password)?;
        self.users.update_password_hash(user_id, &hash).await?;
        self.sessions.delete_by_user_except(user_id, None).await?;

        tracing::info!(user_id = %user_id, "password reset");
        Ok(())
    }
}
