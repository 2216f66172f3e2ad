use chrono::Utc;
use uuid::Uuid;

use tracker_auth_types::token::issue_two_factor_ticket;
use tracker_domain::validate::{
    USER_NAME_MAX_LEN, normalize_email, normalize_username, required_text, validate_password,
};

use crate::crypto::{hash_password, verify_password};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::types::{ClientMeta, TWO_FACTOR_TICKET_TTL_SECS, User};
use crate::error::TrackerError;
use crate::usecase::session::{SignedIn, open_session};

/// Check `password` against the user's credential account.
pub(crate) async fn check_password<U>(
    users: &U,
    user_id: Uuid,
    password: &str,
) -> Result<(), TrackerError>
where
    U: UserRepository,
{
    let hash = users
        .find_password_hash(user_id)
        .await?
        .ok_or(TrackerError::InvalidCredentials)?;
    if !verify_password(password, &hash)? {
        return Err(TrackerError::InvalidCredentials);
    }
    Ok(())
}

// ── Sign up ───────────────────────────────────────────────────────────────────

pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

pub struct SignUpUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub users: U,
    pub sessions: S,
}

impl<U, S> SignUpUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        input: SignUpInput,
        meta: ClientMeta,
    ) -> Result<SignedIn, TrackerError> {
        let name = required_text("name", &input.name, USER_NAME_MAX_LEN)?;
        let email = normalize_email(&input.email)?;
        validate_password(&input.password)?;
        let username = match input.username.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(normalize_username(raw)?),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(TrackerError::EmailTaken);
        }
        if let Some(username) = &username {
            if self.users.find_by_username(&username.normalized).await?.is_some() {
                return Err(TrackerError::UsernameTaken);
            }
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();
        let (username, display_username) = match username {
            Some(u) => (Some(u.normalized), Some(u.display)),
            None => (None, None),
        };
        let user = User {
            id: Uuid::now_v7(),
            name,
            email,
            email_verified: false,
            username,
            display_username,
            image: None,
            two_factor_enabled: false,
            created_at: now,
            updated_at: now,
        };
        self.users.create_with_account(&user, &password_hash).await?;

        tracing::info!(user_id = %user.id, "user signed up");
        open_session(&self.sessions, user, meta).await
    }
}

// ── Sign in ───────────────────────────────────────────────────────────────────

/// How the user identified themselves on the password form.
pub enum SignInIdentifier {
    Email(String),
    Username(String),
}

pub enum SignInOutcome {
    SignedIn(SignedIn),
    /// Password accepted; a second factor is still required.
    TwoFactorRequired { ticket: String },
}

pub struct SignInUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub users: U,
    pub sessions: S,
    pub auth_secret: String,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        identifier: SignInIdentifier,
        password: &str,
        meta: ClientMeta,
    ) -> Result<SignInOutcome, TrackerError> {
        // Malformed identifiers are reported like unknown ones.
        let user = match identifier {
            SignInIdentifier::Email(raw) => match normalize_email(&raw) {
                Ok(email) => self.users.find_by_email(&email).await?,
                Err(_) => None,
            },
            SignInIdentifier::Username(raw) => match normalize_username(&raw) {
                Ok(username) => self.users.find_by_username(&username.normalized).await?,
                Err(_) => None,
            },
        }
        .ok_or(TrackerError::InvalidCredentials)?;

        check_password(&self.users, user.id, password).await?;

        if user.two_factor_enabled {
            let exp = Utc::now().timestamp() + TWO_FACTOR_TICKET_TTL_SECS;
            let ticket = issue_two_factor_ticket(user.id, exp as u64, &self.auth_secret)
                .map_err(|e| TrackerError::Internal(e.into()))?;
            return Ok(SignInOutcome::TwoFactorRequired { ticket });
        }

        let signed_in = open_session(&self.sessions, user, meta).await?;
        Ok(SignInOutcome::SignedIn(signed_in))
    }
}

// ── Change password ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub revoke_other_sessions: bool,
}

pub struct ChangePasswordUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub users: U,
    pub sessions: S,
}

impl<U, S> ChangePasswordUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
        input: ChangePasswordInput,
    ) -> Result<(), TrackerError> {
        validate_password(&input.new_password)?;
        check_password(&self.users, user_id, &input.current_password).await?;

        let hash = hash_password(&input.new_password)?;
        self.users.update_password_hash(user_id, &hash).await?;

        if input.revoke_other_sessions {
            self.sessions
                .delete_by_user_except(user_id, Some(current_session_id))
                .await?;
        }
        Ok(())
    }
}

// ── Username availability ─────────────────────────────────────────────────────

pub struct CheckUsernameUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> CheckUsernameUseCase<U>
where
    U: UserRepository,
{
    /// `caller`'s own username counts as available.
    pub async fn execute(&self, raw: &str, caller: Option<Uuid>) -> Result<bool, TrackerError> {
        let username = normalize_username(raw)?;
        let available = match self.users.find_by_username(&username.normalized).await? {
            None => true,
            Some(owner) => Some(owner.id) == caller,
        };
        Ok(available)
    }
}
