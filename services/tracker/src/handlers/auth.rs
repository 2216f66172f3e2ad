use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_auth_types::cookie::{
    clear_session_cookie, clear_two_factor_cookie, set_session_cookie, set_two_factor_cookie,
};

use crate::domain::types::ClientMeta;
use crate::error::TrackerError;
use crate::extract::{ClientInfo, CurrentUser, JsonBody};
use crate::handlers::AvailabilityResponse;
use crate::handlers::user::{UserEnvelope, UserResponse};
use crate::state::AppState;
use crate::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, CheckUsernameUseCase, SignInIdentifier,
    SignInOutcome, SignInUseCase, SignUpInput, SignUpUseCase,
};
use crate::usecase::password_reset::{ForgetPasswordUseCase, ResetPasswordUseCase};
use crate::usecase::session::{
    ListSessionsUseCase, RevokeOtherSessionsUseCase, RevokeSessionUseCase, SignOutUseCase,
};

// ── POST /api/auth/sign-up/email ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

pub async fn sign_up_email(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    jar: CookieJar,
    JsonBody(body): JsonBody<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserEnvelope>), TrackerError> {
    let usecase = SignUpUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
    };
    let signed_in = usecase
        .execute(
            SignUpInput {
                name: body.name,
                email: body.email,
                password: body.password,
                username: body.username,
            },
            meta,
        )
        .await?;

    let jar = set_session_cookie(jar, signed_in.token, state.cookie_domain.clone());
    let user = UserResponse::from(signed_in.user);
    Ok((StatusCode::CREATED, jar, Json(UserEnvelope { user })))
}

// ── POST /api/auth/sign-in/{email,username} ──────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub two_factor_redirect: bool,
}

#[derive(Deserialize)]
pub struct EmailSignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UsernameSignInRequest {
    pub username: String,
    pub password: String,
}

pub async fn sign_in_email(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    jar: CookieJar,
    JsonBody(body): JsonBody<EmailSignInRequest>,
) -> Result<Response, TrackerError> {
    sign_in(
        state,
        jar,
        SignInIdentifier::Email(body.email),
        &body.password,
        meta,
    )
    .await
}

pub async fn sign_in_username(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    jar: CookieJar,
    JsonBody(body): JsonBody<UsernameSignInRequest>,
) -> Result<Response, TrackerError> {
    sign_in(
        state,
        jar,
        SignInIdentifier::Username(body.username),
        &body.password,
        meta,
    )
    .await
}

async fn sign_in(
    state: AppState,
    jar: CookieJar,
    identifier: SignInIdentifier,
    password: &str,
    meta: ClientMeta,
) -> Result<Response, TrackerError> {
    let usecase = SignInUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        auth_secret: state.auth_secret.clone(),
    };
    let domain = state.cookie_domain.clone();
    match usecase.execute(identifier, password, meta).await? {
        SignInOutcome::SignedIn(signed_in) => {
            let jar = set_session_cookie(jar, signed_in.token, domain);
            let body = SignInResponse {
                user: Some(signed_in.user.into()),
                two_factor_redirect: false,
            };
            Ok((jar, Json(body)).into_response())
        }
        SignInOutcome::TwoFactorRequired { ticket } => {
            let jar = set_two_factor_cookie(jar, ticket, domain);
            let body = SignInResponse {
                user: None,
                two_factor_redirect: true,
            };
            Ok((jar, Json(body)).into_response())
        }
    }
}

// ── POST /api/auth/sign-out ──────────────────────────────────────────────────

pub async fn sign_out(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), TrackerError> {
    let usecase = SignOutUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(ctx.session.id).await?;
    let jar = clear_session_cookie(jar, state.cookie_domain.clone());
    let jar = clear_two_factor_cookie(jar, state.cookie_domain.clone());
    Ok((StatusCode::NO_CONTENT, jar))
}

// ── GET /api/auth/get-session ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    pub current: bool,
}

#[derive(Serialize)]
pub struct GetSessionResponse {
    pub session: SessionResponse,
    pub user: UserResponse,
}

/// Re-sets the cookie when the session window slid, so the browser's
/// Max-Age follows the server-side expiry.
pub async fn get_session(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<GetSessionResponse>) {
    let jar = if ctx.refreshed {
        set_session_cookie(jar, ctx.token.clone(), state.cookie_domain.clone())
    } else {
        jar
    };
    let body = GetSessionResponse {
        session: SessionResponse {
            id: ctx.session.id,
            user_agent: ctx.session.user_agent,
            ip_address: ctx.session.ip_address,
            created_at: ctx.session.created_at,
            expires_at: ctx.session.expires_at,
            current: true,
        },
        user: ctx.user.into(),
    };
    (jar, Json(body))
}

// ── GET /api/auth/list-sessions ──────────────────────────────────────────────

pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<SessionResponse>>, TrackerError> {
    let usecase = ListSessionsUseCase {
        sessions: state.session_repo(),
    };
    let list = usecase.execute(ctx.user.id, ctx.session.id).await?;
    let body = list
        .into_iter()
        .map(|info| SessionResponse {
            id: info.session.id,
            user_agent: info.session.user_agent,
            ip_address: info.session.ip_address,
            created_at: info.session.created_at,
            expires_at: info.session.expires_at,
            current: info.current,
        })
        .collect();
    Ok(Json(body))
}

// ── POST /api/auth/revoke-session ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RevokeSessionRequest {
    pub id: Uuid,
}

pub async fn revoke_session(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<RevokeSessionRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = RevokeSessionUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(ctx.user.id, body.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/auth/revoke-other-sessions ─────────────────────────────────────

pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<StatusCode, TrackerError> {
    let usecase = RevokeOtherSessionsUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(ctx.user.id, ctx.session.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/auth/change-password ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(default)]
    pub revoke_other_sessions: bool,
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
    };
    usecase
        .execute(
            ctx.user.id,
            ctx.session.id,
            ChangePasswordInput {
                current_password: body.current_password,
                new_password: body.new_password,
                revoke_other_sessions: body.revoke_other_sessions,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/auth/is-username-available ─────────────────────────────────────

#[derive(Deserialize)]
pub struct UsernameAvailableRequest {
    pub username: String,
}

pub async fn is_username_available(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<UsernameAvailableRequest>,
) -> Result<Json<AvailabilityResponse>, TrackerError> {
    let usecase = CheckUsernameUseCase {
        users: state.user_repo(),
    };
    let available = usecase.execute(&body.username, None).await?;
    Ok(Json(AvailabilityResponse { available }))
}

// ── POST /api/auth/forget-password ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct ForgetPasswordRequest {
    pub email: String,
}

pub async fn forget_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ForgetPasswordRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = ForgetPasswordUseCase {
        users: state.user_repo(),
        verifications: state.verification_repo(),
    };
    usecase.execute(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/auth/reset-password ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ResetPasswordRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        verifications: state.verification_repo(),
        sessions: state.session_repo(),
    };
    usecase.execute(&body.token, &body.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
