use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webauthn_rs::prelude::{PublicKeyCredential, RegisterPublicKeyCredential};

use tracker_auth_types::cookie::set_session_cookie;

use crate::error::TrackerError;
use crate::extract::{ClientInfo, CurrentUser, JsonBody, QueryParams};
use crate::handlers::header;
use crate::handlers::user::UserEnvelope;
use crate::state::AppState;
use crate::usecase::passkey::{
    DeletePasskeyUseCase, FinishAuthenticationUseCase, FinishRegistrationUseCase,
    ListPasskeysUseCase, PasskeyInfo, RenamePasskeyUseCase, StartAuthenticationUseCase,
    StartRegistrationUseCase,
};

pub const REGISTRATION_ID_HEADER: &str = "x-tracker-passkey-registration-id";
pub const AUTHENTICATION_ID_HEADER: &str = "x-tracker-passkey-authentication-id";

// ── GET /api/auth/passkeys ───────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub aaguid: Uuid,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<PasskeyInfo> for PasskeyResponse {
    fn from(info: PasskeyInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            aaguid: info.aaguid,
            created_at: info.created_at,
        }
    }
}

pub async fn list_passkeys(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<PasskeyResponse>>, TrackerError> {
    let usecase = ListPasskeysUseCase {
        passkeys: state.passkey_repo(),
    };
    let list = usecase.execute(ctx.user.id).await?;
    Ok(Json(list.into_iter().map(PasskeyResponse::from).collect()))
}

// ── PATCH /api/auth/passkeys/{id} ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RenamePasskeyRequest {
    pub name: Option<String>,
}

pub async fn rename_passkey(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(body): JsonBody<RenamePasskeyRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = RenamePasskeyUseCase {
        passkeys: state.passkey_repo(),
    };
    usecase
        .execute(id, ctx.user.id, body.name.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /api/auth/passkeys/{id} ───────────────────────────────────────────

pub async fn delete_passkey(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TrackerError> {
    let usecase = DeletePasskeyUseCase {
        passkeys: state.passkey_repo(),
    };
    usecase.execute(id, ctx.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/auth/passkey/registration ──────────────────────────────────────

pub async fn start_registration(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<impl IntoResponse, TrackerError> {
    let usecase = StartRegistrationUseCase {
        users: state.user_repo(),
        passkeys: state.passkey_repo(),
        cache: state.passkey_cache(),
        webauthn: state.webauthn.clone(),
    };
    let out = usecase.execute(ctx.user.id).await?;
    let headers = [header(REGISTRATION_ID_HEADER, &out.registration_id)?];
    Ok((StatusCode::OK, headers, Json(out.challenge)))
}

// ── PATCH /api/auth/passkey/registration?registration-id=&name= ──────────────

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistrationQuery {
    pub registration_id: String,
    pub name: Option<String>,
}

pub async fn finish_registration(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    QueryParams(query): QueryParams<RegistrationQuery>,
    JsonBody(credential): JsonBody<RegisterPublicKeyCredential>,
) -> Result<(StatusCode, Json<PasskeyResponse>), TrackerError> {
    let usecase = FinishRegistrationUseCase {
        passkeys: state.passkey_repo(),
        cache: state.passkey_cache(),
        webauthn: state.webauthn.clone(),
    };
    let info = usecase
        .execute(
            ctx.user.id,
            &query.registration_id,
            query.name.as_deref(),
            credential,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(info.into())))
}

// ── POST /api/auth/passkey/authentication ────────────────────────────────────

#[derive(Deserialize)]
pub struct StartAuthenticationRequest {
    /// Email address or username.
    pub identifier: String,
}

pub async fn start_authentication(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StartAuthenticationRequest>,
) -> Result<impl IntoResponse, TrackerError> {
    let usecase = StartAuthenticationUseCase {
        users: state.user_repo(),
        passkeys: state.passkey_repo(),
        cache: state.passkey_cache(),
        webauthn: state.webauthn.clone(),
    };
    let out = usecase.execute(&body.identifier).await?;
    let headers = [header(AUTHENTICATION_ID_HEADER, &out.authentication_id)?];
    Ok((StatusCode::OK, headers, Json(out.challenge)))
}

// ── PATCH /api/auth/passkey/authentication?authentication-id= ────────────────

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthenticationQuery {
    pub authentication_id: String,
}

pub async fn finish_authentication(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    jar: CookieJar,
    QueryParams(query): QueryParams<AuthenticationQuery>,
    JsonBody(credential): JsonBody<PublicKeyCredential>,
) -> Result<(CookieJar, Json<UserEnvelope>), TrackerError> {
    let usecase = FinishAuthenticationUseCase {
        users: state.user_repo(),
        passkeys: state.passkey_repo(),
        cache: state.passkey_cache(),
        sessions: state.session_repo(),
        webauthn: state.webauthn.clone(),
    };
    let signed_in = usecase
        .execute(&query.authentication_id, credential, meta)
        .await?;
    let jar = set_session_cookie(jar, signed_in.token, state.cookie_domain.clone());
    Ok((
        jar,
        Json(UserEnvelope {
            user: signed_in.user.into(),
        }),
    ))
}
