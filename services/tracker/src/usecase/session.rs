use chrono::{Duration, Utc};
use uuid::Uuid;

use tracker_auth_types::token::{generate_session_token, hash_token};

use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::types::{ClientMeta, SESSION_TTL_SECS, Session, User};
use crate::error::TrackerError;

/// A freshly opened session and the raw token to put in the cookie.
pub struct SignedIn {
    pub user: User,
    pub token: String,
}

/// Create a session row for `user` and return the raw token.
pub async fn open_session<S>(
    sessions: &S,
    user: User,
    meta: ClientMeta,
) -> Result<SignedIn, TrackerError>
where
    S: SessionRepository,
{
    let token = generate_session_token();
    let session = Session::new(user.id, hash_token(&token), meta, Utc::now());
    sessions.create(&session).await?;
    Ok(SignedIn { user, token })
}

// ── Resolve session ───────────────────────────────────────────────────────────

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub session: Session,
    /// Raw token, needed to re-issue the cookie after a refresh.
    pub token: String,
    /// The session window was extended by this request.
    pub refreshed: bool,
}

pub struct ResolveSessionUseCase<S, U>
where
    S: SessionRepository,
    U: UserRepository,
{
    pub sessions: S,
    pub users: U,
}

impl<S, U> ResolveSessionUseCase<S, U>
where
    S: SessionRepository,
    U: UserRepository,
{
    pub async fn execute(&self, token: &str) -> Result<AuthContext, TrackerError> {
        let mut session = self
            .sessions
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(TrackerError::Unauthorized)?;

        let now = Utc::now();
        if session.is_expired(now) {
            self.sessions.delete(session.id).await?;
            return Err(TrackerError::Unauthorized);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(TrackerError::Unauthorized)?;

        let refreshed = session.needs_refresh(now);
        if refreshed {
            session.expires_at = now + Duration::seconds(SESSION_TTL_SECS);
            session.updated_at = now;
            self.sessions
                .extend(session.id, session.expires_at, session.updated_at)
                .await?;
        }

        Ok(AuthContext {
            user,
            session,
            token: token.to_owned(),
            refreshed,
        })
    }
}

// ── Sign out ──────────────────────────────────────────────────────────────────

pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(&self, session_id: Uuid) -> Result<(), TrackerError> {
        self.sessions.delete(session_id).await
    }
}

// ── List sessions ─────────────────────────────────────────────────────────────

pub struct SessionInfo {
    pub session: Session,
    pub current: bool,
}

pub struct ListSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> ListSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
    ) -> Result<Vec<SessionInfo>, TrackerError> {
        let sessions = self.sessions.list_by_user(user_id).await?;
        Ok(sessions
            .into_iter()
            .map(|session| SessionInfo {
                current: session.id == current_session_id,
                session,
            })
            .collect())
    }
}

// ── Revoke ────────────────────────────────────────────────────────────────────

pub struct RevokeSessionUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> RevokeSessionUseCase<S>
where
    S: SessionRepository,
{
    /// Returns 404 if the session does not exist or belongs to another user.
    pub async fn execute(&self, user_id: Uuid, session_id: Uuid) -> Result<(), TrackerError> {
        if !self.sessions.delete_for_user(session_id, user_id).await? {
            return Err(TrackerError::SessionNotFound);
        }
        Ok(())
    }
}

pub struct RevokeOtherSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> RevokeOtherSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(&self, user_id: Uuid, current_session_id: Uuid) -> Result<(), TrackerError> {
        self.sessions
            .delete_by_user_except(user_id, Some(current_session_id))
            .await
    }
}
