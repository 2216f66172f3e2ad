use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use tracker_auth_types::cookie::{TRACKER_TWO_FACTOR, clear_two_factor_cookie, set_session_cookie};
use tracker_auth_types::session::SessionToken;

use crate::domain::types::ClientMeta;
use crate::error::TrackerError;
use crate::extract::{ClientInfo, CurrentUser, JsonBody};
use crate::handlers::user::UserEnvelope;
use crate::state::AppState;
use crate::usecase::session::{AuthContext, ResolveSessionUseCase};
use crate::usecase::two_factor::{
    CompleteTwoFactorSignInUseCase, ConfirmTwoFactorUseCase, DisableTwoFactorUseCase,
    EnableTwoFactorUseCase, GenerateBackupCodesUseCase, SecondFactor,
};

#[derive(Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

// ── POST /api/auth/two-factor/enable ─────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableResponse {
    #[serde(rename = "totpURI")]
    pub totp_uri: String,
    pub backup_codes: Vec<String>,
}

pub async fn enable(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<PasswordRequest>,
) -> Result<Json<EnableResponse>, TrackerError> {
    let usecase = EnableTwoFactorUseCase {
        users: state.user_repo(),
        two_factors: state.two_factor_repo(),
        totp: state.totp_settings(),
    };
    let out = usecase.execute(&ctx.user, &body.password).await?;
    Ok(Json(EnableResponse {
        totp_uri: out.totp_uri,
        backup_codes: out.backup_codes,
    }))
}

// ── POST /api/auth/two-factor/verify-totp ────────────────────────────────────

/// Signed in: confirms enrolment. Otherwise: completes a pending sign-in
/// from the two-factor ticket cookie.
pub async fn verify_totp(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    headers: HeaderMap,
    jar: CookieJar,
    JsonBody(body): JsonBody<CodeRequest>,
) -> Result<Response, TrackerError> {
    if let Some(ctx) = optional_session(&state, &headers).await? {
        let usecase = ConfirmTwoFactorUseCase {
            two_factors: state.two_factor_repo(),
            totp: state.totp_settings(),
        };
        usecase.execute(&ctx.user, &body.code).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    complete_sign_in(state, jar, SecondFactor::Totp(body.code), meta).await
}

// ── POST /api/auth/two-factor/verify-backup-code ─────────────────────────────

pub async fn verify_backup_code(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    jar: CookieJar,
    JsonBody(body): JsonBody<CodeRequest>,
) -> Result<Response, TrackerError> {
    complete_sign_in(state, jar, SecondFactor::BackupCode(body.code), meta).await
}

/// A stale session cookie must not block the ticket path.
async fn optional_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AuthContext>, TrackerError> {
    let Some(token) = SessionToken::from_headers(headers) else {
        return Ok(None);
    };
    let usecase = ResolveSessionUseCase {
        sessions: state.session_repo(),
        users: state.user_repo(),
    };
    match usecase.execute(&token.0).await {
        Ok(ctx) => Ok(Some(ctx)),
        Err(TrackerError::Unauthorized) => Ok(None),
        Err(e) => Err(e),
    }
}

async fn complete_sign_in(
    state: AppState,
    jar: CookieJar,
    factor: SecondFactor,
    meta: ClientMeta,
) -> Result<Response, TrackerError> {
    let ticket = jar
        .get(TRACKER_TWO_FACTOR)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(TrackerError::InvalidTwoFactorTicket)?;

    let usecase = CompleteTwoFactorSignInUseCase {
        users: state.user_repo(),
        two_factors: state.two_factor_repo(),
        sessions: state.session_repo(),
        totp: state.totp_settings(),
        auth_secret: state.auth_secret.clone(),
    };
    let signed_in = usecase.execute(&ticket, factor, meta).await?;

    let jar = clear_two_factor_cookie(jar, state.cookie_domain.clone());
    let jar = set_session_cookie(jar, signed_in.token, state.cookie_domain.clone());
    let body = UserEnvelope {
        user: signed_in.user.into(),
    };
    Ok((jar, Json(body)).into_response())
}

// ── POST /api/auth/two-factor/generate-backup-codes ──────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCodesResponse {
    pub backup_codes: Vec<String>,
}

pub async fn generate_backup_codes(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<PasswordRequest>,
) -> Result<Json<BackupCodesResponse>, TrackerError> {
    let usecase = GenerateBackupCodesUseCase {
        users: state.user_repo(),
        two_factors: state.two_factor_repo(),
    };
    let backup_codes = usecase.execute(ctx.user.id, &body.password).await?;
    Ok(Json(BackupCodesResponse { backup_codes }))
}

// ── POST /api/auth/two-factor/disable ────────────────────────────────────────

pub async fn disable(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<PasswordRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = DisableTwoFactorUseCase {
        users: state.user_repo(),
        two_factors: state.two_factor_repo(),
    };
    usecase.execute(ctx.user.id, &body.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
